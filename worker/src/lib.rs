//! C4 dispatch worker: consumes `WorkItem`s off the queue and runs the
//! per-message procedure of spec.md §4.4 against the reasoning graph.
//!
//! **Public API**: [`WorkerDeps`], [`run_forever`], [`dispatch::dispatch_one`].

mod dispatch;

pub use dispatch::{dispatch_one, DispatchError, DispatchOutcome};

use objectstore::BlobStore;
use reasoninggraph::ReasoningGraph;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use store::Store;
use workqueue::WorkQueue;

/// Everything one dispatch needs, shared across every message the process
/// handles. `project_tool_servers` and `external_mcp_server_url` are
/// resolved once at startup from `config::Settings` (spec.md §6
/// `{PROVIDER}_MCP_SERVER_URL` / `EXTERNAL_MCP_SERVER_URL`).
pub struct WorkerDeps {
    pub store: Arc<Store>,
    pub queue: Arc<dyn WorkQueue>,
    pub blob_store: Arc<dyn BlobStore>,
    pub graph: Arc<dyn ReasoningGraph>,
    pub local_base: PathBuf,
    pub max_message_age: Duration,
    pub project_tool_servers: Vec<(String, String)>,
    pub external_mcp_server_url: Option<String>,
}

/// The closed set of provider names `toolserver` discovers project-scoped
/// MCP servers for (spec.md §4.1, §6 — each resolves `{PROVIDER}_MCP_SERVER_URL`).
pub const PROJECT_TOOL_PROVIDERS: &[&str] = &["looker", "redash", "atlan", "datazone"];

/// Resolves the subset of `PROJECT_TOOL_PROVIDERS` that have a configured
/// URL in the environment, for use in [`WorkerDeps::project_tool_servers`].
pub fn configured_project_tool_servers() -> Vec<(String, String)> {
    PROJECT_TOOL_PROVIDERS
        .iter()
        .filter_map(|name| config::Settings::provider_mcp_server_url(name).map(|url| (name.to_string(), url)))
        .collect()
}

/// Runs the consume loop until the queue returns a non-recoverable receive
/// error. `recv` failures happen before any message has been early-acked
/// (spec.md §4.4.4's note that the recoverable/non-recoverable split only
/// ever applies to "queue-level errors during message receipt" in this
/// architecture), so they're classified by [`retry::is_recoverable`]: a
/// recoverable one is retried with [`retry::ReconnectBackoff`], anything
/// else ends the loop so the process can exit and a supervisor can escalate
/// instead of spinning on a fatal misconfiguration.
pub async fn run_forever(deps: Arc<WorkerDeps>) {
    let mut backoff = retry::ReconnectBackoff::new();
    loop {
        match deps.queue.recv().await {
            Ok(delivery) => {
                backoff.reset();
                dispatch_one(&deps, delivery).await;
            }
            Err(e) if retry::is_recoverable(&e.to_string()) => {
                let delay = backoff.next_delay();
                tracing::warn!(error = %e, retry_in_secs = delay.as_secs(), "queue receive failed; backing off");
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "queue receive failed with a non-recoverable error; stopping");
                return;
            }
        }
    }
}

mod retry;
