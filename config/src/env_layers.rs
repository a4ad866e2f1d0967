//! The two low-priority configuration layers [`apply`] merges in underneath
//! the process environment: a project `.env` file and an XDG
//! `config.toml`'s `[env]` table.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::SettingsError;

/// Applies `.env` (searched in `override_dir`, or the current directory if
/// `None`) and `$XDG_CONFIG_HOME/<app_name>/config.toml` to the process
/// environment: `.env` wins ties against the XDG file, and a variable
/// already present in the environment is never overwritten by either.
pub fn apply(app_name: &str, override_dir: Option<&Path>) -> Result<(), SettingsError> {
    let mut resolved = read_xdg_toml(app_name)?;
    resolved.append(&mut read_dotenv(override_dir)?);

    for (key, value) in resolved {
        if std::env::var_os(&key).is_none() {
            std::env::set_var(key, value);
        }
    }
    Ok(())
}

fn xdg_config_path(app_name: &str) -> Result<Option<PathBuf>, SettingsError> {
    let dirs = cross_xdg::BaseDirs::new().map_err(|e| SettingsError::XdgPath(e.to_string()))?;
    let path = dirs.config_home().join(app_name).join("config.toml");
    Ok(path.is_file().then_some(path))
}

fn read_xdg_toml(app_name: &str) -> Result<BTreeMap<String, String>, SettingsError> {
    let Some(path) = xdg_config_path(app_name)? else {
        return Ok(BTreeMap::new());
    };

    #[derive(serde::Deserialize, Default)]
    struct XdgFile {
        #[serde(default)]
        env: BTreeMap<String, String>,
    }

    let raw = std::fs::read_to_string(&path).map_err(SettingsError::XdgRead)?;
    let parsed: XdgFile = toml::from_str(&raw)?;
    Ok(parsed.env)
}

fn read_dotenv(override_dir: Option<&Path>) -> Result<BTreeMap<String, String>, SettingsError> {
    let dir = match override_dir {
        Some(d) => d.to_path_buf(),
        None => std::env::current_dir().map_err(SettingsError::DotenvRead)?,
    };
    let path = dir.join(".env");
    if !path.is_file() {
        return Ok(BTreeMap::new());
    }

    let raw = std::fs::read_to_string(&path).map_err(SettingsError::DotenvRead)?;
    Ok(raw.lines().filter_map(parse_dotenv_line).collect())
}

/// One `KEY=VALUE` line: blank lines and `#`-led comments are skipped,
/// surrounding single or double quotes are stripped, and a double-quoted
/// value additionally unescapes `\"`.
fn parse_dotenv_line(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let (key, raw_value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), unquote(raw_value.trim())))
}

fn unquote(value: &str) -> String {
    let bytes = value.as_bytes();
    match (bytes.first(), bytes.last()) {
        (Some(b'"'), Some(b'"')) if value.len() >= 2 => value[1..value.len() - 1].replace("\\\"", "\""),
        (Some(b'\''), Some(b'\'')) if value.len() >= 2 => value[1..value.len() - 1].to_string(),
        _ => value.to_string(),
    }
}
