//! Builds everything `dispatch::process` needs from a `WorkItem` before the
//! reasoning graph is invoked: tool aggregator config, the cancellation
//! callback, and the graph inputs/config pair (spec.md §4.4 steps 5, 7).

use crate::WorkerDeps;
use domain::{Agent, DataSource, DataSourceType, WorkItem};
use reasoninggraph::{CancellationCheck, Configurable, GraphInputs, GraphInvocationConfig};
use std::sync::Arc;
use store::Store;
use toolserver::{AggregatorConfig, ExternalServerConfig, ToolConfig};

/// The reasoning graph's recursion-limit ceiling (spec.md §4.4 step 7 — not a
/// per-project setting, just a fixed guard against runaway graphs).
const DEFAULT_RECURSION_LIMIT: u32 = 100;

/// The first connected, non-empty `github` access token among the project's
/// data sources, used to gate and authorize the external tool server.
fn github_token(data_sources: &[DataSource]) -> Option<String> {
    data_sources.iter().find_map(|ds| match &ds.kind {
        DataSourceType::Github(cfg) if ds.is_connected() && !cfg.access_token.is_empty() => {
            Some(cfg.access_token.clone())
        }
        _ => None,
    })
}

pub fn build_aggregator_config(deps: &WorkerDeps, agent: &Agent, data_sources: &[DataSource]) -> AggregatorConfig {
    AggregatorConfig {
        project_scoped_servers: deps.project_tool_servers.clone(),
        external_server: deps.external_mcp_server_url.as_ref().map(|url| ExternalServerConfig {
            name: "github".to_string(),
            base_url: url.clone(),
            github_access_token: github_token(data_sources),
        }),
        agent_scoped_servers: agent.tool_servers.clone(),
    }
}

/// Polls the assistant task's current status; the graph implementation calls
/// this before the stream starts and before each emission (spec.md §4.4.1).
pub fn build_cancellation_check(store: Arc<Store>, assistant_task_id: String) -> CancellationCheck {
    Arc::new(move || {
        let store = store.clone();
        let id = assistant_task_id.clone();
        Box::pin(async move { matches!(store.get_task_status(&id).await, Ok(Some(domain::TaskStatus::Cancelled))) })
    })
}

pub fn build_graph_invocation(
    item: &WorkItem,
    agent: &Agent,
    tools: ToolConfig,
    credentials: projectsync::CredentialSet,
) -> (GraphInputs, GraphInvocationConfig) {
    let inputs = GraphInputs {
        question: item.content.clone(),
        context_flag: true,
        context: serde_json::json!({}),
        output_format: agent.output_format,
        tools,
    };
    let configurable = Configurable {
        thread_id: item.metadata.thread_id.clone().unwrap_or_else(|| item.assistant_task_id.clone()),
        assistant_task_id: item.assistant_task_id.clone(),
        project: item.project_id.clone(),
        env_variables: credentials,
        override_project_id: item.metadata.override_project_id.clone(),
        checkpoint_ns: item.metadata.checkpoint_ns.clone(),
        checkpoint_id: item.metadata.checkpoint_id.clone(),
    };
    let config = GraphInvocationConfig {
        recursion_limit: DEFAULT_RECURSION_LIMIT,
        configurable,
    };
    (inputs, config)
}
