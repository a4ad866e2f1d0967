//! Axum app: shared state and router assembly (spec.md §6's HTTP surface).

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use store::Store;
use workqueue::WorkQueue;

use crate::{agents, data_sources, projects, tasks};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub queue: Arc<dyn WorkQueue>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/projects", post(projects::create).get(projects::list))
        .route("/projects/:pid", get(projects::get).delete(projects::delete))
        .route(
            "/projects/:pid/agents",
            post(agents::create).get(agents::list),
        )
        .route(
            "/projects/:pid/agents/:aid",
            get(agents::get).delete(agents::delete),
        )
        .route("/projects/:pid/agents/:aid/tools", get(agents::tools))
        .route(
            "/projects/:pid/agents/:aid/env-variables",
            get(agents::env_variables),
        )
        .route(
            "/projects/:pid/data-sources",
            post(data_sources::create).get(data_sources::list),
        )
        .route(
            "/projects/:pid/agents/:aid/messages",
            post(tasks::create_message),
        )
        .route(
            "/projects/:pid/agents/:aid/tasks",
            get(tasks::list_agent_tasks),
        )
        .route(
            "/projects/:pid/agents/:aid/tasks/:tid",
            get(tasks::get_task).put(tasks::update_task),
        )
        .route(
            "/projects/:pid/agents/:aid/tasks/:tid/cancel",
            post(tasks::cancel_task),
        )
        .with_state(state)
}
