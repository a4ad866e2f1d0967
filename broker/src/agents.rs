use crate::app::AppState;
use crate::error::ApiError;
use axum::extract::{Path, State};
use axum::Json;
use domain::{Agent, AgentToolServer, OutputFormat};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct CreateAgentRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default = "default_output_format")]
    pub output_format: OutputFormat,
    #[serde(default)]
    pub tool_servers: Vec<AgentToolServer>,
    #[serde(default)]
    pub env_variables: BTreeMap<String, String>,
}

fn default_output_format() -> OutputFormat {
    OutputFormat::Text
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Path(pid): Path<String>,
    Json(req): Json<CreateAgentRequest>,
) -> Result<Json<Agent>, ApiError> {
    let agent = Agent {
        id: uuid::Uuid::new_v4().to_string(),
        project_id: pid,
        name: req.name,
        description: req.description,
        instructions: req.instructions,
        output_format: req.output_format,
        tool_servers: req.tool_servers,
        env_variables: req.env_variables,
    };
    Ok(Json(state.store.create_agent(agent).await?))
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Path(pid): Path<String>,
) -> Result<Json<Vec<Agent>>, ApiError> {
    Ok(Json(state.store.list_agents(&pid).await?))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path((_pid, aid)): Path<(String, String)>,
) -> Result<Json<Agent>, ApiError> {
    Ok(Json(state.store.get_agent(&aid).await?))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path((_pid, aid)): Path<(String, String)>,
) -> Result<(), ApiError> {
    state.store.delete_agent(&aid).await?;
    Ok(())
}

pub async fn tools(
    State(state): State<Arc<AppState>>,
    Path((_pid, aid)): Path<(String, String)>,
) -> Result<Json<Vec<AgentToolServer>>, ApiError> {
    Ok(Json(state.store.get_agent(&aid).await?.tool_servers))
}

pub async fn env_variables(
    State(state): State<Arc<AppState>>,
    Path((_pid, aid)): Path<(String, String)>,
) -> Result<Json<BTreeMap<String, String>>, ApiError> {
    Ok(Json(state.store.get_agent(&aid).await?.env_variables))
}
