use domain::DataSourceType;
use std::collections::{BTreeMap, HashMap};

pub type CredentialSet = HashMap<String, String>;

const ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";

/// Builds the env map a reasoning-graph invocation runs with. Never mutates
/// `std::env`; the result is passed by value into the invocation config
/// (spec.md §4.2, §9 "shared mutable env -> per-invocation context").
pub fn resolve_credentials(
    project_id: &str,
    agent_env: &BTreeMap<String, String>,
    data_sources: &[domain::DataSource],
) -> CredentialSet {
    let mut env: CredentialSet = agent_env.clone().into_iter().collect();
    env.remove(ANTHROPIC_API_KEY);

    if let Some(system_key) = data_sources.iter().find_map(|ds| match &ds.kind {
        DataSourceType::Anthropic(cfg) if !cfg.api_key.is_empty() => Some(cfg.api_key.clone()),
        _ => None,
    }) {
        env.insert(ANTHROPIC_API_KEY.to_string(), system_key);
    }

    let project_prefix = project_id.to_ascii_uppercase();
    for ds in data_sources {
        let type_suffix = ds.kind.env_suffix();
        for (field, value) in ds.kind.secret_fields() {
            let name = format!("{project_prefix}_{type_suffix}_{field}");
            env.insert(name, value);
        }
    }

    env
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domain::{AnthropicConfig, DataSource, DataSourceStatus, GithubConfig, SnowflakeConfig};

    fn source(project_id: &str, kind: DataSourceType, status: DataSourceStatus) -> DataSource {
        DataSource {
            id: uuid::Uuid::new_v4().to_string(),
            project_id: project_id.to_string(),
            name: "source".into(),
            kind,
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn system_anthropic_key_overrides_user_supplied_one() {
        let mut agent_env = BTreeMap::new();
        agent_env.insert(ANTHROPIC_API_KEY.to_string(), "USER".to_string());
        let sources = vec![source(
            "acme",
            DataSourceType::Anthropic(AnthropicConfig {
                api_key: "SYSTEM".into(),
                extra: Default::default(),
            }),
            DataSourceStatus::Connected,
        )];

        let resolved = resolve_credentials("acme", &agent_env, &sources);
        assert_eq!(resolved.get(ANTHROPIC_API_KEY), Some(&"SYSTEM".to_string()));
    }

    #[test]
    fn env_names_follow_project_type_field_uppercase_discipline() {
        let sources = vec![source(
            "acme",
            DataSourceType::Github(GithubConfig {
                access_token: "ghp_123".into(),
                extra: Default::default(),
            }),
            DataSourceStatus::Connected,
        )];

        let resolved = resolve_credentials("acme", &BTreeMap::new(), &sources);
        assert_eq!(resolved.get("ACME_GITHUB_ACCESS_TOKEN"), Some(&"ghp_123".to_string()));
    }

    #[test]
    fn multiple_data_source_types_each_emit_their_own_fields() {
        let sources = vec![
            source(
                "acme",
                DataSourceType::Github(GithubConfig {
                    access_token: "ghp_123".into(),
                    extra: Default::default(),
                }),
                DataSourceStatus::Connected,
            ),
            source(
                "acme",
                DataSourceType::Snowflake(SnowflakeConfig {
                    account: "acct".into(),
                    user: "u".into(),
                    private_key: "pk".into(),
                    extra: Default::default(),
                }),
                DataSourceStatus::Connected,
            ),
        ];

        let resolved = resolve_credentials("acme", &BTreeMap::new(), &sources);
        assert_eq!(resolved.get("ACME_GITHUB_ACCESS_TOKEN"), Some(&"ghp_123".to_string()));
        assert_eq!(resolved.get("ACME_SNOWFLAKE_PRIVATE_KEY"), Some(&"pk".to_string()));
        assert_eq!(resolved.get("ACME_SNOWFLAKE_ACCOUNT"), Some(&"acct".to_string()));
    }

    #[test]
    fn no_anthropic_source_leaves_user_supplied_key_stripped() {
        let mut agent_env = BTreeMap::new();
        agent_env.insert(ANTHROPIC_API_KEY.to_string(), "USER".to_string());
        let resolved = resolve_credentials("acme", &agent_env, &[]);
        assert_eq!(resolved.get(ANTHROPIC_API_KEY), None);
    }
}
