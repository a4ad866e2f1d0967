//! Task: the unit of work, and its five-state status machine.
//!
//! The source this spec was distilled from declared `TaskStatus` twice (one
//! masking the other, see spec.md §9 REDESIGN FLAGS); this is the single
//! authoritative enum.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Queued,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled)
    }

    /// Whether `self -> next` is a legal transition per the state machine in
    /// spec.md §4.3. `Cancelled` is reachable from any non-terminal state
    /// (T-3); `Completed`/`Failed` are terminal and never re-entered (T-2,
    /// P-4); a status may be "transitioned" to itself (idempotent update,
    /// P-5).
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        if self == next {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        match next {
            TaskStatus::Cancelled => true,
            TaskStatus::Processing => matches!(self, TaskStatus::Queued),
            TaskStatus::Completed | TaskStatus::Failed => matches!(self, TaskStatus::Processing),
            TaskStatus::Queued => false,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskRole {
    User,
    Assistant,
}

/// One task record. `content` is an opaque string to `store`: for user tasks
/// it is the raw message text, for assistant tasks it is a JSON document
/// `{response, cancelled?, error?, error_details?}` (spec.md §7).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    pub project_id: String,
    pub agent_id: String,
    pub role: TaskRole,
    pub content: String,
    pub status: TaskStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<crate::WorkItemMetadata>,
}
