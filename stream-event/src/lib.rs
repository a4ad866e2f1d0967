//! Reasoning-graph node events, plus envelope (session_id, node_id, event_id)
//! injection for the history map `worker` streams into task content.
//!
//! This crate defines the wire shape only; it does not depend on `worker` or
//! `reasoninggraph` so either side can be swapped independently.

pub mod envelope;
pub mod event;

pub use envelope::{to_json, Envelope, EnvelopeState};
pub use event::{NodeEvent, NodeKind};
