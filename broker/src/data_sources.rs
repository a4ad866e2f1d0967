use crate::app::AppState;
use crate::error::ApiError;
use axum::extract::{Path, State};
use axum::Json;
use domain::{DataSource, DataSourceType};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct CreateDataSourceRequest {
    pub name: String,
    #[serde(flatten)]
    pub kind: DataSourceType,
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Path(pid): Path<String>,
    Json(req): Json<CreateDataSourceRequest>,
) -> Result<Json<DataSource>, ApiError> {
    Ok(Json(state.store.create_data_source(&pid, &req.name, req.kind).await?))
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Path(pid): Path<String>,
) -> Result<Json<Vec<DataSource>>, ApiError> {
    Ok(Json(state.store.list_data_sources(&pid).await?))
}
