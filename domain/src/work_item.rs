//! WorkItem: the ephemeral message published to the work queue. Lifetime
//! ends at early-ack (spec.md §3, §6).

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct WorkItemMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint_ns: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint_id: Option<String>,
    #[serde(default = "default_stream")]
    pub stream: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_project_id: Option<String>,
}

fn default_stream() -> bool {
    true
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkItemAction {
    ProcessAgentTask,
}

/// Wire format published to the work queue; matches spec.md §6 exactly.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkItem {
    pub task_id: String,
    pub assistant_task_id: String,
    pub project_id: String,
    pub agent_id: String,
    pub content: String,
    #[serde(default)]
    pub metadata: WorkItemMetadata,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub action: WorkItemAction,
}

impl WorkItem {
    /// The project id tool-server and sync code should scope to: the
    /// override when present, else the task's own project (spec.md §4.4
    /// step 5 — "the user-facing project for task updates remains the
    /// original").
    pub fn tool_scope_project_id(&self) -> &str {
        self.metadata
            .override_project_id
            .as_deref()
            .unwrap_or(&self.project_id)
    }
}
