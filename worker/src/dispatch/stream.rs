//! Streaming update loop: consumes the reasoning graph's node emissions,
//! accumulating the latest value per node and mirroring a derived status
//! into the assistant task's content while the task stays `Processing`
//! (spec.md §4.4.2).
//!
//! spec.md §4.4.1 names two independent cancellation backstops: the
//! callback the graph polls internally, and a second poll the worker
//! itself owns between emissions, closing the stream on its own if the
//! graph doesn't honour the callback promptly. `original_source`'s
//! `inference-worker/main_managed.py`'s `async for event in
//! stream_generator` loop re-checks task status before handling each event
//! and calls `stream_generator.aclose()` on a detected cancel — this loop
//! does the same, independent of whatever the graph's own callback does.

use domain::TaskStatus;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde_json::Value;
use std::collections::HashMap;
use store::Store;
use stream_event::NodeEvent;

pub enum StreamOutcome {
    /// The stream closed on its own; terminal classification still needs to
    /// decide completed/failed/cancelled from the accumulated history.
    Completed(HashMap<String, Value>),
    /// The worker's own poll saw the task cancelled and closed the stream
    /// early; the cancellation has already been persisted.
    Cancelled,
}

pub async fn run_streaming_loop(
    store: &Store,
    assistant_task_id: &str,
    mut stream: BoxStream<'static, NodeEvent>,
) -> StreamOutcome {
    let mut history: HashMap<String, Value> = HashMap::new();

    while let Some(event) = stream.next().await {
        if matches!(store.get_task_status(assistant_task_id).await, Ok(Some(TaskStatus::Cancelled))) {
            drop(stream);
            let content = serde_json::json!({"response": "Task was cancelled by user.", "cancelled": true}).to_string();
            if let Err(e) = store.update_task(assistant_task_id, TaskStatus::Cancelled, &content).await {
                tracing::warn!(error = %e, assistant_task_id, "failed to persist cancellation observed mid-stream");
            }
            return StreamOutcome::Cancelled;
        }

        history.insert(event.node.name().to_string(), event.payload.clone());

        let content = serde_json::json!({"status": event.node.display_status()}).to_string();
        if let Err(e) = store.update_task(assistant_task_id, TaskStatus::Processing, &content).await {
            tracing::warn!(error = %e, assistant_task_id, "failed to write streaming status update");
        }

        // A generation/answer node (or a payload carrying `response`) marks
        // the phase complete, but the terminal status itself is only written
        // once the stream closes (§4.4.3) — completing here would race a
        // concurrent cancel that hasn't been observed by `cancel` yet.
        if event.marks_completed() {
            tracing::debug!(node = event.node.name(), assistant_task_id, "node marks phase complete");
        }
    }

    StreamOutcome::Completed(history)
}
