use std::sync::Arc;
use store::Store;
use workqueue::{AmqpWorkQueue, WorkQueue};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt::init();
    let settings = config::Settings::from_env("chicory", None)?;

    let db_path = std::env::var("BROKER_DB").unwrap_or_else(|_| "broker.db".to_string());
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

    let addr = std::env::var("BROKER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    broker::run_broker(Some(&addr), store, queue).await
}
