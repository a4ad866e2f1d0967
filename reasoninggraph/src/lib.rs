//! The reasoning graph itself is out of scope (spec.md Non-goals): this
//! crate only models the contract the worker invokes against — an async
//! streaming call taking inputs/config/a cancellation callback and yielding
//! `{node_name: node_value}` emissions (spec.md §4.4) — plus a deterministic
//! mock so `worker` can be tested without a real LLM-backed graph.

mod mock;

pub use mock::{MockReasoningGraph, ScriptedEmission};

use async_trait::async_trait;
use domain::OutputFormat;
use futures::stream::BoxStream;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Polled by the graph implementation before the stream starts and before
/// each emission; `true` means the caller observed the task as cancelled
/// and the graph should stop (spec.md §4.4.1).
pub type CancellationCheck = Arc<dyn Fn() -> futures::future::BoxFuture<'static, bool> + Send + Sync>;

#[derive(Clone, Debug, Serialize)]
pub struct GraphInputs {
    pub question: String,
    pub context_flag: bool,
    pub context: serde_json::Value,
    pub output_format: OutputFormat,
    /// The aggregated tool catalog and server routing table from `toolserver`
    /// (spec.md §4.4 step 7). Not serialisable as JSON since it carries
    /// bearer headers; skipped rather than leaked into any logged/serialised
    /// view of `GraphInputs`.
    #[serde(skip)]
    pub tools: toolserver::ToolConfig,
}

#[derive(Clone, Debug, Serialize, Default)]
pub struct Configurable {
    pub thread_id: String,
    pub assistant_task_id: String,
    pub project: String,
    pub env_variables: HashMap<String, String>,
    pub override_project_id: Option<String>,
    pub checkpoint_ns: Option<String>,
    pub checkpoint_id: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct GraphInvocationConfig {
    pub recursion_limit: u32,
    pub configurable: Configurable,
}

/// The external streaming contract. The worker never constructs a graph
/// directly; it depends only on this trait so tests run against
/// [`MockReasoningGraph`].
#[async_trait]
pub trait ReasoningGraph: Send + Sync {
    async fn stream(
        &self,
        inputs: GraphInputs,
        config: GraphInvocationConfig,
        cancel: CancellationCheck,
    ) -> BoxStream<'static, stream_event::NodeEvent>;
}
