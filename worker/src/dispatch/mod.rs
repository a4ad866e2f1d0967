//! Per-message dispatch: age check → early ack → initial status updates →
//! project sync → tool aggregation → reasoning graph invocation → streaming
//! loop → terminal classification (spec.md §4.4, steps 1-9).
//!
//! Grounded on the teacher's `serve/src/run/{mod,request,stream,delivery}.rs`
//! prepare → spawn → stream → terminal-classify pipeline, re-plumbed so the
//! sink is `store::Store::update_task` instead of a live WebSocket.

mod prepare;
mod stream;
mod terminal;

use crate::WorkerDeps;
use domain::{TaskStatus, WorkItem};
use thiserror::Error;
use workqueue::Delivery;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("store: {0}")]
    Store(#[from] store::StoreError),
}

#[derive(Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The message was older than `max_age` and was dropped without running
    /// any business logic (spec.md §4.4 step 1).
    Dropped,
    /// The message ran through to some terminal classification (or failed
    /// and was marked `Failed`); either way it has been acked.
    Processed,
}

/// Handles one delivery end-to-end. Never returns an error: a failure partway
/// through is caught and turned into a `Failed` task update, since the
/// message has already been acked and there is no queue-level retry path
/// left once early-ack has happened.
pub async fn dispatch_one(deps: &WorkerDeps, delivery: Delivery) -> DispatchOutcome {
    let item = delivery.item;

    if is_stale(&item, deps.max_message_age) {
        if let Err(e) = deps.queue.ack(delivery.tag).await {
            tracing::warn!(error = %e, task_id = %item.task_id, "ack of stale message failed");
        }
        tracing::warn!(task_id = %item.task_id, "dropping message past max_age without processing");
        return DispatchOutcome::Dropped;
    }

    // Early ack (step 2): acked before any business logic runs, so a crash
    // partway through never causes redelivery and reprocessing.
    if let Err(e) = deps.queue.ack(delivery.tag).await {
        tracing::error!(error = %e, task_id = %item.task_id, "early ack failed; message may be redelivered");
    }

    if let Err(e) = process(deps, &item).await {
        tracing::error!(error = %e, task_id = %item.task_id, "dispatch failed after early ack");
        let content = serde_json::json!({
            "response": format!("Error processing message: {e}"),
            "error": true,
            "error_details": e.to_string(),
        })
        .to_string();
        if let Err(e) = deps.store.update_task(&item.assistant_task_id, TaskStatus::Failed, &content).await {
            tracing::error!(error = %e, task_id = %item.task_id, "failed to persist Failed classification after dispatch error");
        }
    }

    DispatchOutcome::Processed
}

fn is_stale(item: &WorkItem, max_age: std::time::Duration) -> bool {
    let age = chrono::Utc::now().signed_duration_since(item.timestamp);
    match chrono::Duration::from_std(max_age) {
        Ok(bound) => age > bound,
        Err(_) => false,
    }
}

async fn process(deps: &WorkerDeps, item: &WorkItem) -> Result<(), DispatchError> {
    // Step 3: initial status updates.
    deps.store.update_task(&item.task_id, TaskStatus::Completed, &item.content).await?;
    deps.store
        .update_task(
            &item.assistant_task_id,
            TaskStatus::Processing,
            &serde_json::json!({"status": "Gathering Context"}).to_string(),
        )
        .await?;

    let scope_project = item.tool_scope_project_id();

    // Step 4: project sync. Best-effort — a sync that can't complete still
    // leaves whatever was materialised before the failure, and the graph may
    // not need project artifacts at all for this question.
    if let Err(e) = projectsync::sync_project(deps.blob_store.as_ref(), scope_project, &deps.local_base).await {
        tracing::warn!(error = %e, project_id = scope_project, "project sync did not complete cleanly");
    }

    let data_sources = deps.store.list_data_sources(scope_project).await?;
    let agent = deps.store.get_agent(&item.agent_id).await?;

    // Step 5: tool aggregation, scoped to `scope_project` (the override when
    // present), while task updates below still target `item`'s own project.
    let agg_cfg = prepare::build_aggregator_config(deps, &agent, &data_sources);
    let tool_config = toolserver::aggregate(scope_project, &agg_cfg).await;

    // Step 6: credential resolution (system Anthropic key override + the
    // per-type env map), scoped to the task's own project.
    let credentials = projectsync::resolve_credentials(&item.project_id, &agent.env_variables, &data_sources);

    // Step 7: reasoning graph invocation.
    let (inputs, config) = prepare::build_graph_invocation(item, &agent, tool_config, credentials);
    let cancel = prepare::build_cancellation_check(deps.store.clone(), item.assistant_task_id.clone());
    let node_stream = deps.graph.stream(inputs, config, cancel).await;

    // Step 8: streaming update loop. A worker-side cancellation poll (spec.md
    // §4.4.1's second backstop, independent of whatever the graph's own
    // callback honours) may already have closed the stream and written the
    // terminal `Cancelled` state itself, in which case step 9 is skipped.
    match stream::run_streaming_loop(&deps.store, &item.assistant_task_id, node_stream).await {
        stream::StreamOutcome::Cancelled => {}
        stream::StreamOutcome::Completed(history) => {
            // Step 9: terminal classification.
            terminal::classify_and_persist(&deps.store, &item.assistant_task_id, history).await?;
        }
    }

    Ok(())
}
