//! Envelope (session_id, node_id, event_id) injected into every node event
//! written to an assistant task's content, so a consumer reading the history
//! map can tell which run and which node a value belongs to.

use crate::event::NodeEvent;
use serde_json::Value;

/// Envelope fields attached to each emitted event.
#[derive(Clone, Debug, Default)]
pub struct Envelope {
    /// Session ID; constant across one task's stream.
    pub session_id: Option<String>,
    /// Node run ID for the node currently emitting.
    pub node_id: Option<String>,
    /// Per-event sequence number; monotonically increasing within a stream.
    pub event_id: Option<u64>,
}

impl Envelope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session_id(mut self, id: impl Into<String>) -> Self {
        self.session_id = Some(id.into());
        self
    }

    pub fn with_node_id(mut self, id: impl Into<String>) -> Self {
        self.node_id = Some(id.into());
        self
    }

    pub fn with_event_id(mut self, id: u64) -> Self {
        self.event_id = Some(id);
        self
    }

    /// Merges envelope fields into the given JSON object (top-level only).
    /// Does not overwrite existing keys.
    pub fn inject_into(&self, obj: &mut Value) {
        let Some(obj) = obj.as_object_mut() else {
            return;
        };
        if let Some(ref id) = self.session_id {
            obj.entry("session_id")
                .or_insert_with(|| Value::String(id.clone()));
        }
        if let Some(ref id) = self.node_id {
            obj.entry("node_id")
                .or_insert_with(|| Value::String(id.clone()));
        }
        if let Some(id) = self.event_id {
            obj.entry("event_id")
                .or_insert_with(|| Value::Number(serde_json::Number::from(id)));
        }
    }
}

/// Envelope state for one task's stream: session_id (the assistant task id),
/// the currently-emitting node's run id, and the next event sequence number.
pub struct EnvelopeState {
    pub session_id: String,
    current_node_name: String,
    node_run_seq: u64,
    next_event_id: u64,
}

impl EnvelopeState {
    pub fn new(session_id: String) -> Self {
        Self {
            session_id,
            current_node_name: String::new(),
            node_run_seq: 0,
            next_event_id: 1,
        }
    }

    fn node_run_id(&mut self, node_name: &str) -> String {
        if node_name != self.current_node_name {
            self.current_node_name = node_name.to_string();
            self.node_run_seq += 1;
        }
        format!("run-{}-{}", self.current_node_name, self.node_run_seq)
    }

    /// Injects envelope into the serialized event and advances state.
    pub fn inject_into(&mut self, node_name: &str, value: &mut Value) {
        let node_id = self.node_run_id(node_name);
        let env = Envelope::new()
            .with_session_id(self.session_id.clone())
            .with_node_id(node_id)
            .with_event_id(self.next_event_id);
        self.next_event_id += 1;
        env.inject_into(value);
    }

    /// Builds the envelope for the final reply (the task's terminal content).
    pub fn reply_envelope(&self) -> Envelope {
        let node_id = if self.current_node_name.is_empty() {
            "run-0".to_string()
        } else {
            format!("run-{}-{}", self.current_node_name, self.node_run_seq)
        };
        Envelope::new()
            .with_session_id(self.session_id.clone())
            .with_node_id(node_id)
            .with_event_id(self.next_event_id)
    }
}

/// Converts a node event to JSON and injects the envelope using the given
/// state. Returns the final value (node + payload + session_id, node_id,
/// event_id).
pub fn to_json(event: &NodeEvent, state: &mut EnvelopeState) -> Result<Value, serde_json::Error> {
    let mut value = serde_json::to_value(event)?;
    state.inject_into(event.node.name(), &mut value);
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::NodeEvent;

    #[test]
    fn envelope_inject_does_not_overwrite_existing_keys() {
        let mut obj = serde_json::json!({"node": "question", "session_id": "keep-me"});
        let env = Envelope::new()
            .with_session_id("sess-1")
            .with_node_id("run-question-1")
            .with_event_id(1);
        env.inject_into(&mut obj);
        assert_eq!(obj["session_id"], "keep-me");
        assert_eq!(obj["node_id"], "run-question-1");
        assert_eq!(obj["event_id"], 1);
    }

    #[test]
    fn to_json_injects_envelope_and_advances_event_id() {
        let ev = NodeEvent::new("question", serde_json::json!({"text": "hi"}));
        let mut state = EnvelopeState::new("assistant-task-123".to_string());
        let first = to_json(&ev, &mut state).unwrap();
        assert_eq!(first["session_id"], "assistant-task-123");
        assert_eq!(first["event_id"], 1);

        let second = to_json(&ev, &mut state).unwrap();
        assert_eq!(second["event_id"], 2);
        assert_eq!(second["node_id"], first["node_id"]);
    }

    #[test]
    fn node_run_id_advances_sequence_when_node_changes() {
        let mut state = EnvelopeState::new("s".to_string());
        let a = state.node_run_id("question");
        let b = state.node_run_id("question");
        let c = state.node_run_id("breakdown");
        assert_eq!(a, b);
        assert_ne!(b, c);
    }
}
