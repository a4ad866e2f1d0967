//! DataSource: a credentialed or uploaded artifact source bound to a project.
//!
//! `DataSourceType` is a closed, tagged enum over per-variant configuration
//! structs rather than the original string-keyed "configuration" mapping —
//! REDESIGN FLAGS in spec.md calls for exactly this; the variant list is the
//! closed set named in spec.md §3.

use serde::{Deserialize, Serialize};

/// Per-type configuration. Unknown fields in the source JSON are preserved in
/// `extra` so a round-trip through `serde_json::Value` doesn't lose data the
/// typed struct doesn't model yet — tool providers may add fields over time.
macro_rules! config_struct {
    ($name:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        #[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
        pub struct $name {
            $(#[serde(default)] pub $field: $ty,)*
            #[serde(flatten)]
            pub extra: std::collections::BTreeMap<String, serde_json::Value>,
        }
    };
}

config_struct!(GithubConfig { access_token: String });
config_struct!(DatabricksConfig { host: String, token: String });
config_struct!(SnowflakeConfig { account: String, user: String, private_key: String });
config_struct!(BigqueryConfig { project: String, service_account_json: String });
config_struct!(S3Config { bucket: String, region: String, access_key_id: String, secret_access_key: String });
config_struct!(GlueConfig { region: String, role_arn: String });
config_struct!(LookerConfig { base_url: String, client_id: String, client_secret: String });
config_struct!(RedashConfig { base_url: String, api_key: String });
config_struct!(AtlanConfig { base_url: String, api_key: String });
config_struct!(DatazoneConfig { domain_id: String, region: String });
config_struct!(AnthropicConfig { api_key: String });
config_struct!(UploadConfig { object_key: String });
config_struct!(WebfetchConfig { allowed_domains: Vec<String> });

/// Closed set of data source kinds, per spec.md §3. Each variant carries a
/// typed configuration struct instead of an opaque mapping.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "configuration", rename_all = "snake_case")]
pub enum DataSourceType {
    Github(GithubConfig),
    Databricks(DatabricksConfig),
    Snowflake(SnowflakeConfig),
    Bigquery(BigqueryConfig),
    S3(S3Config),
    Glue(GlueConfig),
    Looker(LookerConfig),
    Redash(RedashConfig),
    Atlan(AtlanConfig),
    Datazone(DatazoneConfig),
    Anthropic(AnthropicConfig),
    GenericFileUpload(UploadConfig),
    CsvUpload(UploadConfig),
    XlsxUpload(UploadConfig),
    FolderUpload(UploadConfig),
    Webfetch(WebfetchConfig),
}

impl DataSourceType {
    /// The upper-case, env-var-safe suffix for this type, used by
    /// `projectsync`'s `{PROJECT}_{TYPE}_{FIELD}` naming discipline (P-6).
    pub fn env_suffix(&self) -> &'static str {
        match self {
            DataSourceType::Github(_) => "GITHUB",
            DataSourceType::Databricks(_) => "DATABRICKS",
            DataSourceType::Snowflake(_) => "SNOWFLAKE",
            DataSourceType::Bigquery(_) => "BIGQUERY",
            DataSourceType::S3(_) => "S3",
            DataSourceType::Glue(_) => "GLUE",
            DataSourceType::Looker(_) => "LOOKER",
            DataSourceType::Redash(_) => "REDASH",
            DataSourceType::Atlan(_) => "ATLAN",
            DataSourceType::Datazone(_) => "DATAZONE",
            DataSourceType::Anthropic(_) => "ANTHROPIC",
            DataSourceType::GenericFileUpload(_) => "GENERIC_FILE_UPLOAD",
            DataSourceType::CsvUpload(_) => "CSV_UPLOAD",
            DataSourceType::XlsxUpload(_) => "XLSX_UPLOAD",
            DataSourceType::FolderUpload(_) => "FOLDER_UPLOAD",
            DataSourceType::Webfetch(_) => "WEBFETCH",
        }
    }

    /// Flattens this variant's typed fields (excluding `extra`) into
    /// `(FIELD_NAME, value)` pairs with upper-case field names, used to build
    /// the `{PROJECT}_{TYPE}_{FIELD}` env map. Only non-empty string fields
    /// are emitted; nested/complex fields are skipped (spec only calls out
    /// scalar secret fields like access tokens and private keys).
    pub fn secret_fields(&self) -> Vec<(String, String)> {
        let value = serde_json::to_value(self).unwrap_or(serde_json::Value::Null);
        let Some(config) = value.get("configuration").and_then(|c| c.as_object()) else {
            return vec![];
        };
        let mut out = Vec::new();
        for (key, v) in config {
            if key == "extra" {
                continue;
            }
            if let Some(s) = v.as_str() {
                if !s.is_empty() {
                    out.push((key.to_ascii_uppercase(), s.to_string()));
                }
            }
        }
        out
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DataSourceStatus {
    Configured,
    Connected,
    Error,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DataSource {
    pub id: String,
    pub project_id: String,
    pub name: String,
    #[serde(flatten)]
    pub kind: DataSourceType,
    pub status: DataSourceStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl DataSource {
    pub fn is_connected(&self) -> bool {
        matches!(self.status, DataSourceStatus::Connected)
    }
}
