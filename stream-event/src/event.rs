//! Reasoning-graph node event vocabulary (spec.md §4.4.2).
//!
//! A reasoning graph emission is a `{node_name: node_value}` map; `NodeKind`
//! is the closed-ish vocabulary of node names the worker knows how to derive
//! a display status for, with `Unknown` absorbing anything else (spec.md's
//! "unknown node name... falls back to the generic 'Generating Response'").

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Question,
    Breakdown,
    DataSummary,
    Documents,
    RelatedContext,
    Generation,
    Error,
    Answer,
    Unknown(String),
}

// Wire shape is the plain node name string, so an `Unknown` node round-trips
// byte-for-byte instead of needing a wrapper object.
impl Serialize for NodeKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for NodeKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(NodeKind::from_name(&s))
    }
}

impl NodeKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "question" => NodeKind::Question,
            "breakdown" => NodeKind::Breakdown,
            "data_summary" => NodeKind::DataSummary,
            "documents" => NodeKind::Documents,
            "related_context" => NodeKind::RelatedContext,
            "generation" => NodeKind::Generation,
            "error" => NodeKind::Error,
            "answer" => NodeKind::Answer,
            other => NodeKind::Unknown(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            NodeKind::Question => "question",
            NodeKind::Breakdown => "breakdown",
            NodeKind::DataSummary => "data_summary",
            NodeKind::Documents => "documents",
            NodeKind::RelatedContext => "related_context",
            NodeKind::Generation => "generation",
            NodeKind::Error => "error",
            NodeKind::Answer => "answer",
            NodeKind::Unknown(s) => s.as_str(),
        }
    }

    /// Human-readable phase label for `assistant_task`'s `PROCESSING` content
    /// (spec.md §4.4.2: "generation/rendering phases map to fixed
    /// human-readable labels"; unknown nodes fall back to a generic label).
    pub fn display_status(&self) -> &'static str {
        match self {
            NodeKind::Question => "Understanding Question",
            NodeKind::Breakdown => "Breaking Down Task",
            NodeKind::DataSummary => "Summarizing Data",
            NodeKind::Documents => "Retrieving Documents",
            NodeKind::RelatedContext => "Gathering Context",
            NodeKind::Generation => "Generating Response",
            NodeKind::Answer => "Finalizing Answer",
            NodeKind::Error => "Handling Error",
            NodeKind::Unknown(_) => "Generating Response",
        }
    }

    /// Whether a node of this kind, by name alone, marks the phase as
    /// completed (spec.md §4.4.2: `generation`/`answer`). The sibling rule —
    /// "any value containing a `response` field" — depends on the payload and
    /// is checked separately by the caller.
    pub fn marks_completed_by_name(&self) -> bool {
        matches!(self, NodeKind::Generation | NodeKind::Answer)
    }
}

/// One emission from the reasoning graph: a node name and its latest value.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeEvent {
    pub node: NodeKind,
    pub payload: Value,
}

impl NodeEvent {
    pub fn new(name: &str, payload: Value) -> Self {
        Self {
            node: NodeKind::from_name(name),
            payload,
        }
    }

    /// Whether `payload` carries a `response` field, the payload-shape half
    /// of the terminal-marking rule in spec.md §4.4.2.
    pub fn payload_has_response_field(&self) -> bool {
        self.payload
            .as_object()
            .map(|o| o.contains_key("response"))
            .unwrap_or(false)
    }

    pub fn marks_completed(&self) -> bool {
        self.node.marks_completed_by_name() || self.payload_has_response_field()
    }
}
