//! C3 task broker: axum HTTP service over `store` + `workqueue`
//! (spec.md §4.3, §6).
//!
//! **Public API**: [`run_broker`], [`run_broker_on_listener`].

mod agents;
mod app;
mod data_sources;
mod error;
mod projects;
mod tasks;

use std::sync::Arc;
use store::Store;
use tokio::net::TcpListener;
use tracing::info;
use workqueue::WorkQueue;

pub use app::{router, AppState};

const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:8080";

/// Runs the broker on an existing listener, sharing `store`/`queue` with
/// whatever else the process wires up (e.g. an in-process worker in tests).
pub async fn run_broker_on_listener(
    listener: TcpListener,
    store: Arc<Store>,
    queue: Arc<dyn WorkQueue>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = listener.local_addr()?;
    info!("task broker listening on http://{}", addr);
    let state = Arc::new(AppState { store, queue });
    axum::serve(listener, router(state)).await?;
    Ok(())
}

pub async fn run_broker(
    addr: Option<&str>,
    store: Arc<Store>,
    queue: Arc<dyn WorkQueue>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = addr.unwrap_or(DEFAULT_HTTP_ADDR);
    let listener = TcpListener::bind(addr).await?;
    run_broker_on_listener(listener, store, queue).await
}
