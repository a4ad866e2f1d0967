use crate::app::AppState;
use crate::error::ApiError;
use axum::extract::{Path, Query, State};
use axum::Json;
use domain::{Task, TaskStatus, WorkItem, WorkItemAction, WorkItemMetadata};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use store::StoreError;

#[derive(Deserialize)]
pub struct CreateMessageRequest {
    pub content: String,
    #[serde(default)]
    pub metadata: WorkItemMetadata,
}

#[derive(Serialize)]
pub struct CreateMessageResponse {
    pub user_task: Task,
    pub assistant_task: Task,
}

/// `create_message` (spec.md §4.3): inserts the task pair and publishes the
/// work item inside the same SQLite transaction, so a publish failure rolls
/// both inserts back (T-1).
pub async fn create_message(
    State(state): State<Arc<AppState>>,
    Path((pid, aid)): Path<(String, String)>,
    Json(req): Json<CreateMessageRequest>,
) -> Result<Json<CreateMessageResponse>, ApiError> {
    let queue = state.queue.clone();
    let metadata = req.metadata.clone();
    let (user_task, assistant_task) = state
        .store
        .create_message_pair(&pid, &aid, &req.content, req.metadata, move |user, assistant| {
            let item = WorkItem {
                task_id: user.id.clone(),
                assistant_task_id: assistant.id.clone(),
                project_id: assistant.project_id.clone(),
                agent_id: assistant.agent_id.clone(),
                content: user.content.clone(),
                metadata: metadata.clone(),
                timestamp: chrono::Utc::now(),
                action: WorkItemAction::ProcessAgentTask,
            };
            tokio::runtime::Handle::current()
                .block_on(queue.publish(&item))
                .map_err(|e| StoreError::Storage(e.to_string()))
        })
        .await?;
    Ok(Json(CreateMessageResponse { user_task, assistant_task }))
}

#[derive(Deserialize, Default)]
pub struct ListTasksQuery {
    pub limit: Option<usize>,
    pub status: Option<TaskStatus>,
    pub sort_order: Option<String>,
}

pub async fn list_agent_tasks(
    State(state): State<Arc<AppState>>,
    Path((_pid, aid)): Path<(String, String)>,
    Query(query): Query<ListTasksQuery>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let mut tasks = state.store.list_agent_tasks(&aid).await?;
    if let Some(status) = query.status {
        tasks.retain(|t| t.status == status);
    }
    if query.sort_order.as_deref() == Some("asc") {
        tasks.reverse();
    }
    if let Some(limit) = query.limit {
        tasks.truncate(limit);
    }
    Ok(Json(tasks))
}

pub async fn get_task(
    State(state): State<Arc<AppState>>,
    Path((_pid, _aid, tid)): Path<(String, String, String)>,
) -> Result<Json<Task>, ApiError> {
    Ok(Json(state.store.get_task(&tid).await?))
}

#[derive(Deserialize)]
pub struct UpdateTaskRequest {
    pub status: Option<TaskStatus>,
    pub content: Option<String>,
}

/// `update_task` (spec.md §4.3): an illegal transition (e.g. `COMPLETED`
/// over an already-`CANCELLED` task, T-3) is rejected by returning the
/// unchanged record, not an HTTP error.
pub async fn update_task(
    State(state): State<Arc<AppState>>,
    Path((_pid, _aid, tid)): Path<(String, String, String)>,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<Json<Task>, ApiError> {
    let current = state.store.get_task(&tid).await?;
    let status = req.status.unwrap_or(current.status);
    let content = req.content.unwrap_or(current.content);
    let updated = state
        .store
        .update_task(&tid, status, &content)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("task {tid}")))?;
    Ok(Json(updated))
}

/// `cancel_task` (spec.md §8 scenario 2): idempotent on an already-terminal
/// task (T-3) via `Store::cancel_task`; the content written here is the
/// canonical user-cancellation payload, so a task cancelled before the
/// worker ever reaches terminal classification already carries the right
/// wording and `worker::dispatch::terminal` simply leaves it alone.
pub async fn cancel_task(
    State(state): State<Arc<AppState>>,
    Path((_pid, _aid, tid)): Path<(String, String, String)>,
) -> Result<Json<Task>, ApiError> {
    let content = serde_json::json!({"response": "Task was cancelled by user.", "cancelled": true}).to_string();
    let cancelled = state
        .store
        .update_task(&tid, TaskStatus::Cancelled, &content)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("task {tid}")))?;
    Ok(Json(cancelled))
}
