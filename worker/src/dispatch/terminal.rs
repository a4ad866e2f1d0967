//! Terminal classification: once the reasoning graph's stream closes, decide
//! whether the assistant task ends `Cancelled`, `Completed`, or `Failed`
//! (spec.md §4.4.3).

use domain::TaskStatus;
use serde_json::Value;
use std::collections::HashMap;
use store::{Store, StoreError};

/// Pulls the final reply text out of the accumulated node history: the
/// `generation` node's value if one was emitted, else the whole history
/// stringified (spec.md §4.4.3).
fn extract_response(history: &HashMap<String, Value>) -> String {
    if let Some(generation) = history.get("generation") {
        return match generation {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
    }
    if history.is_empty() {
        return String::new();
    }
    let accumulated: Value = history.iter().map(|(k, v)| (k.clone(), v.clone())).collect::<serde_json::Map<_, _>>().into();
    accumulated.to_string()
}

/// The canonical cancellation string, or a `cancelled: true` flag nested in
/// any accumulated node payload.
fn looks_cancelled(history: &HashMap<String, Value>, response: &str) -> bool {
    if response.trim().eq_ignore_ascii_case("cancelled") {
        return true;
    }
    history
        .values()
        .any(|v| v.get("cancelled").and_then(Value::as_bool).unwrap_or(false))
}

pub async fn classify_and_persist(
    store: &Store,
    assistant_task_id: &str,
    history: HashMap<String, Value>,
) -> Result<(), StoreError> {
    let response = extract_response(&history);

    if looks_cancelled(&history, &response) {
        let content = serde_json::json!({"response": response, "cancelled": true}).to_string();
        store.update_task(assistant_task_id, TaskStatus::Cancelled, &content).await?;
        return Ok(());
    }

    // T-3: re-read status immediately before writing a terminal outcome so a
    // cancel that landed while the stream was still running always wins,
    // without needing a transactional compare-and-swap.
    let current = store.get_task_status(assistant_task_id).await?;
    if current == Some(TaskStatus::Cancelled) {
        return Ok(());
    }

    if !response.trim().is_empty() {
        let content = serde_json::json!({"response": response}).to_string();
        store.update_task(assistant_task_id, TaskStatus::Completed, &content).await?;
    } else {
        let content = serde_json::json!({"response": "Failed to generate response", "error": true}).to_string();
        store.update_task(assistant_task_id, TaskStatus::Failed, &content).await?;
    }
    Ok(())
}
