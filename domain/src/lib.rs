//! Shared data model for the task execution platform.
//!
//! One type per entity in the system (`Project`, `Agent`, `DataSource`, `Task`,
//! `WorkItem`); no persistence or transport logic lives here, only the shapes
//! that `store`, `workqueue`, `broker` and `worker` pass between each other.

mod data_source;
mod task;
mod tool;
mod work_item;

pub use data_source::{
    AnthropicConfig, AtlanConfig, BigqueryConfig, DatabricksConfig, DataSource, DataSourceStatus,
    DataSourceType, DatazoneConfig, GithubConfig, GlueConfig, LookerConfig, RedashConfig,
    S3Config, SnowflakeConfig, UploadConfig, WebfetchConfig,
};
pub use task::{Task, TaskRole, TaskStatus};
pub use tool::{Tool, ToolCatalog};
pub use work_item::{WorkItem, WorkItemAction, WorkItemMetadata};

use serde::{Deserialize, Serialize};

/// A named scope owning data sources, agents, tasks and an artifact namespace
/// in the object store.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Output format an agent's assistant tasks are rendered in. Advisory only —
/// the worker does not validate that the reasoning graph's response matches.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Text,
    Json,
    Markdown,
}

/// An MCP-style tool server attached directly to an agent (as opposed to a
/// project-scoped or external tool server discovered by `toolserver`).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentToolServer {
    pub tool_type: String,
    pub server_url: String,
}

/// A user-configured persona within a project: instructions, output shape,
/// agent-scoped tool servers, and per-agent environment variables (subject to
/// the system Anthropic key override in `projectsync`).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Agent {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub description: String,
    pub instructions: String,
    pub output_format: OutputFormat,
    #[serde(default)]
    pub tool_servers: Vec<AgentToolServer>,
    #[serde(default)]
    pub env_variables: std::collections::BTreeMap<String, String>,
}
