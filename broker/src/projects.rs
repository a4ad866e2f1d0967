use crate::app::AppState;
use crate::error::ApiError;
use axum::extract::{Path, State};
use axum::Json;
use domain::Project;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateProjectRequest>,
) -> Result<Json<Project>, ApiError> {
    Ok(Json(state.store.create_project(&req.name).await?))
}

pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Project>>, ApiError> {
    Ok(Json(state.store.list_projects().await?))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(pid): Path<String>,
) -> Result<Json<Project>, ApiError> {
    Ok(Json(state.store.get_project(&pid).await?))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(pid): Path<String>,
) -> Result<(), ApiError> {
    state.store.delete_project(&pid).await?;
    Ok(())
}
