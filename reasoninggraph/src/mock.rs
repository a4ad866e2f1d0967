use crate::{CancellationCheck, GraphInputs, GraphInvocationConfig, ReasoningGraph};
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::time::Duration;
use stream_event::NodeEvent;
use tokio_stream::wrappers::ReceiverStream;

/// One step of a scripted graph run: a node emission, optionally preceded by
/// an artificial delay (to simulate a stall a cancellation poll can catch).
#[derive(Clone, Debug)]
pub struct ScriptedEmission {
    pub node_name: String,
    pub payload: serde_json::Value,
    pub delay: Option<Duration>,
}

impl ScriptedEmission {
    pub fn new(node_name: &str, payload: serde_json::Value) -> Self {
        Self {
            node_name: node_name.to_string(),
            payload,
            delay: None,
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// A deterministic stand-in for the real reasoning graph: plays back a
/// fixed sequence of node emissions, honouring the cancellation callback
/// between steps exactly as the real contract requires (spec.md §4.4.1).
pub struct MockReasoningGraph {
    script: Vec<ScriptedEmission>,
}

impl MockReasoningGraph {
    pub fn new(script: Vec<ScriptedEmission>) -> Self {
        Self { script }
    }
}

#[async_trait]
impl ReasoningGraph for MockReasoningGraph {
    async fn stream(
        &self,
        _inputs: GraphInputs,
        _config: GraphInvocationConfig,
        cancel: CancellationCheck,
    ) -> BoxStream<'static, NodeEvent> {
        let script = self.script.clone();
        let (tx, rx) = tokio::sync::mpsc::channel(8);

        tokio::spawn(async move {
            if cancel().await {
                return;
            }
            for step in script {
                if let Some(delay) = step.delay {
                    tokio::time::sleep(delay).await;
                }
                if cancel().await {
                    return;
                }
                if tx.send(NodeEvent::new(&step.node_name, step.payload)).await.is_err() {
                    return;
                }
            }
        });

        Box::pin(ReceiverStream::new(rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::OutputFormat;
    use futures::StreamExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn never_cancelled() -> CancellationCheck {
        Arc::new(|| Box::pin(async { false }))
    }

    fn sample_inputs() -> GraphInputs {
        GraphInputs {
            question: "hi".into(),
            context_flag: true,
            context: serde_json::json!({}),
            output_format: OutputFormat::Text,
            tools: Default::default(),
        }
    }

    fn sample_config() -> GraphInvocationConfig {
        GraphInvocationConfig {
            recursion_limit: 50,
            configurable: Default::default(),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn plays_back_the_full_script_in_order() {
        let graph = MockReasoningGraph::new(vec![
            ScriptedEmission::new("question", serde_json::json!("hi")),
            ScriptedEmission::new("generation", serde_json::json!({"response": "hello"})),
        ]);
        let mut events = graph.stream(sample_inputs(), sample_config(), never_cancelled()).await;
        let first = events.next().await.unwrap();
        assert_eq!(first.node.name(), "question");
        let second = events.next().await.unwrap();
        assert_eq!(second.node.name(), "generation");
        assert!(events.next().await.is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn cancellation_observed_before_first_emission_yields_empty_stream() {
        let graph = MockReasoningGraph::new(vec![ScriptedEmission::new(
            "question",
            serde_json::json!("hi"),
        )]);
        let cancel: CancellationCheck = Arc::new(|| Box::pin(async { true }));
        let mut events = graph.stream(sample_inputs(), sample_config(), cancel).await;
        assert!(events.next().await.is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn cancellation_observed_mid_stream_stops_remaining_emissions() {
        let graph = MockReasoningGraph::new(vec![
            ScriptedEmission::new("question", serde_json::json!("hi")),
            ScriptedEmission::new("breakdown", serde_json::json!("steps")).after(Duration::from_millis(20)),
            ScriptedEmission::new("generation", serde_json::json!({"response": "hello"})),
        ]);
        // Calls in order: pre-loop check, before-"question" check (both must
        // say "not cancelled" so the first event gets emitted), then
        // before-"breakdown" check says "cancelled".
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let cancel: CancellationCheck = Arc::new(move || {
            let counter = counter.clone();
            Box::pin(async move { counter.fetch_add(1, Ordering::SeqCst) >= 2 })
        });

        let mut events = graph.stream(sample_inputs(), sample_config(), cancel).await;
        let first = events.next().await.unwrap();
        assert_eq!(first.node.name(), "question");
        assert!(events.next().await.is_none());
    }
}
