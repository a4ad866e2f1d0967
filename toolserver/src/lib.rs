//! C1: tool-server aggregator. Discovers tool catalogs from per-project,
//! external, and agent-scoped MCP-style servers and merges them into one
//! `ToolConfig`, tolerating partial failure (spec.md §4.1, P-7).

use domain::{AgentToolServer, Tool, ToolCatalog};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

const PROJECT_SERVER_TIMEOUT: Duration = Duration::from_secs(5);
const EXTERNAL_SERVER_TIMEOUT: Duration = Duration::from_secs(8);

/// A server the reasoning graph can call tools against directly, keyed by
/// name in [`ToolConfig::servers`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolServerEntry {
    pub url: String,
    pub headers: BTreeMap<String, String>,
}

/// The aggregator's output: a per-server routing table for the reasoning
/// graph, plus the merged, schema-normalised tool catalog (spec.md §4.1
/// steps 4–5).
#[derive(Clone, Debug, Default)]
pub struct ToolConfig {
    pub servers: BTreeMap<String, ToolServerEntry>,
    pub catalog: ToolCatalog,
}

/// The external tool server is only attempted when a connected `github`
/// data source was found; `github_access_token` carries the bearer in that
/// case (spec.md §4.1 step 2).
pub struct ExternalServerConfig {
    pub name: String,
    pub base_url: String,
    pub github_access_token: Option<String>,
}

pub struct AggregatorConfig {
    pub project_scoped_servers: Vec<(String, String)>,
    pub external_server: Option<ExternalServerConfig>,
    pub agent_scoped_servers: Vec<AgentToolServer>,
}

#[derive(Deserialize)]
struct RawTool {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    parameters: Option<serde_json::Value>,
}

fn normalize_schema(parameters: Option<serde_json::Value>) -> serde_json::Value {
    let mut schema = parameters.unwrap_or_else(|| {
        serde_json::json!({"type": "object", "properties": {}, "required": []})
    });
    if let Some(obj) = schema.as_object_mut() {
        obj.insert("additionalProperties".to_string(), serde_json::Value::Bool(false));
        obj.entry("$schema")
            .or_insert_with(|| serde_json::Value::String("http://json-schema.org/draft-07/schema#".to_string()));
    }
    schema
}

async fn fetch_tools(
    client: &reqwest::Client,
    base_url: &str,
    project_id: &str,
    bearer: Option<&str>,
) -> Result<Vec<RawTool>, reqwest::Error> {
    let url = format!("{}/mcp/{}", base_url.trim_end_matches('/'), project_id);
    let mut req = client.get(&url);
    if let Some(token) = bearer {
        req = req.bearer_auth(token);
    }
    req.send().await?.error_for_status()?.json::<Vec<RawTool>>().await
}

async fn fetch_with_timeout(
    client: &reqwest::Client,
    name: &str,
    base_url: &str,
    project_id: &str,
    bearer: Option<&str>,
    timeout: Duration,
) -> Vec<Tool> {
    match tokio::time::timeout(timeout, fetch_tools(client, base_url, project_id, bearer)).await {
        Ok(Ok(raw_tools)) => raw_tools
            .into_iter()
            .map(|t| Tool {
                name: t.name,
                description: t.description,
                parameters_schema: normalize_schema(t.parameters),
                provider_tag: name.to_string(),
            })
            .collect(),
        Ok(Err(e)) => {
            tracing::warn!(server = name, error = %e, "tool server request failed");
            Vec::new()
        }
        Err(_) => {
            tracing::warn!(server = name, timeout_secs = timeout.as_secs(), "tool server listing timed out");
            Vec::new()
        }
    }
}

/// Runs the full discovery/merge algorithm. Never fails: a server that
/// errors or times out contributes zero tools but never aborts the rest
/// (P-7).
pub async fn aggregate(project_id: &str, cfg: &AggregatorConfig) -> ToolConfig {
    let client = reqwest::Client::new();
    let mut servers = BTreeMap::new();
    let mut tools = Vec::new();

    let project_calls = cfg.project_scoped_servers.iter().map(|(name, base_url)| {
        let client = &client;
        async move {
            let found = fetch_with_timeout(client, name, base_url, project_id, None, PROJECT_SERVER_TIMEOUT).await;
            (name.clone(), base_url.clone(), found)
        }
    });
    for (name, base_url, found) in futures::future::join_all(project_calls).await {
        servers.insert(
            name,
            ToolServerEntry {
                url: base_url,
                headers: BTreeMap::new(),
            },
        );
        tools.extend(found);
    }

    if let Some(external) = &cfg.external_server {
        if let Some(token) = &external.github_access_token {
            let found = fetch_with_timeout(
                &client,
                &external.name,
                &external.base_url,
                project_id,
                Some(token),
                EXTERNAL_SERVER_TIMEOUT,
            )
            .await;
            let mut headers = BTreeMap::new();
            headers.insert("Authorization".to_string(), format!("Bearer {token}"));
            servers.insert(
                external.name.clone(),
                ToolServerEntry {
                    url: external.base_url.clone(),
                    headers,
                },
            );
            tools.extend(found);
        }
    }

    for agent_server in &cfg.agent_scoped_servers {
        if agent_server.tool_type != "mcp" {
            continue;
        }
        let name = agent_server.server_url.clone();
        let found = fetch_with_timeout(&client, &name, &agent_server.server_url, project_id, None, PROJECT_SERVER_TIMEOUT).await;
        servers.insert(
            name,
            ToolServerEntry {
                url: agent_server.server_url.clone(),
                headers: BTreeMap::new(),
            },
        );
        tools.extend(found);
    }

    ToolConfig {
        servers,
        catalog: ToolCatalog { tools },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_schema_defaults_when_parameters_absent() {
        let schema = normalize_schema(None);
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["additionalProperties"], false);
        assert!(schema["$schema"].is_string());
    }

    #[test]
    fn normalize_schema_stamps_additional_properties_false_without_dropping_fields() {
        let schema = normalize_schema(Some(serde_json::json!({
            "type": "object",
            "properties": {"query": {"type": "string"}}
        })));
        assert_eq!(schema["additionalProperties"], false);
        assert_eq!(schema["properties"]["query"]["type"], "string");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn aggregate_with_no_servers_returns_empty_catalog() {
        let cfg = AggregatorConfig {
            project_scoped_servers: vec![],
            external_server: None,
            agent_scoped_servers: vec![],
        };
        let result = aggregate("proj-1", &cfg).await;
        assert!(result.catalog.is_empty());
        assert!(result.servers.is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn external_server_skipped_without_github_credential() {
        let cfg = AggregatorConfig {
            project_scoped_servers: vec![],
            external_server: Some(ExternalServerConfig {
                name: "external".into(),
                base_url: "http://unreachable.invalid".into(),
                github_access_token: None,
            }),
            agent_scoped_servers: vec![],
        };
        let result = aggregate("proj-1", &cfg).await;
        assert!(result.servers.is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unreachable_project_server_contributes_zero_tools_but_is_still_listed() {
        let cfg = AggregatorConfig {
            project_scoped_servers: vec![("flaky".to_string(), "http://127.0.0.1:1".to_string())],
            external_server: None,
            agent_scoped_servers: vec![],
        };
        let result = aggregate("proj-1", &cfg).await;
        assert!(result.catalog.is_empty());
        assert!(result.servers.contains_key("flaky"));
    }
}
