use objectstore::LocalFsStore;
use reasoninggraph::MockReasoningGraph;
use std::sync::Arc;
use store::Store;
use worker::WorkerDeps;
use workqueue::{AmqpWorkQueue, WorkQueue};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt::init();
    let settings = config::Settings::from_env("chicory", None)?;

    let db_path = std::env::var("WORKER_DB").unwrap_or_else(|_| "broker.db".to_string());
    let store = Arc::new(Store::new(&db_path)?);

    let queue: Arc<dyn WorkQueue> = Arc::new(
        AmqpWorkQueue::connect(
            &settings.queue.amqp_uri(),
            &settings.queue.queue_name,
            &settings.queue.exchange,
            &settings.queue.routing_key,
        )
        .await?,
    );

    let blob_store = Arc::new(LocalFsStore::new(settings.base_dir.join("objects")));

    // The reasoning graph itself is out of scope for this service: a real
    // deployment wires an HTTP- or in-process-backed `ReasoningGraph` here.
    // `MockReasoningGraph` with an empty script keeps the binary runnable
    // end-to-end (every task completes as `Failed: Failed to generate
    // response`) until that implementation is plugged in.
    let graph = Arc::new(MockReasoningGraph::new(vec![]));

    let deps = Arc::new(WorkerDeps {
        store,
        queue,
        blob_store,
        graph,
        local_base: settings.base_dir.join("workspaces"),
        max_message_age: settings.max_message_age,
        project_tool_servers: worker::configured_project_tool_servers(),
        external_mcp_server_url: settings.external_mcp_server_url.clone(),
    });

    worker::run_forever(deps).await;
    Err("queue consumer stopped after a non-recoverable error".into())
}
