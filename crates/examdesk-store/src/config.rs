//! Store configuration and loading.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Whether the store rejects a second record with the same email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailPolicy {
    /// Reject creates and updates that collide (case-insensitive) with
    /// another record in the same collection.
    #[default]
    Unique,
    /// Accept duplicates; email lookups return the first match.
    Unchecked,
}

/// What deleting a student or exam does to the results that refer to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeletePolicy {
    /// Remove the dependent results as well.
    #[default]
    Cascade,
    /// Refuse the delete while dependent results exist.
    Restrict,
    /// Leave dependent results in place; reads skip them.
    Orphan,
}

impl fmt::Display for DeletePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeletePolicy::Cascade => write!(f, "cascade"),
            DeletePolicy::Restrict => write!(f, "restrict"),
            DeletePolicy::Orphan => write!(f, "orphan"),
        }
    }
}

/// Policies the in-memory store enforces at its boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub email_policy: EmailPolicy,
    #[serde(default)]
    pub delete_policy: DeletePolicy,
}

/// Top-level examdesk configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamdeskConfig {
    /// Seed file loaded by CLI commands when `--data` is not given.
    #[serde(default)]
    pub data_path: Option<PathBuf>,
    /// Default `tracing` filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    #[serde(default)]
    pub store: StoreConfig,
}

fn default_log_filter() -> String {
    "examdesk=info".to_string()
}

impl Default for ExamdeskConfig {
    fn default() -> Self {
        Self {
            data_path: None,
            log_filter: default_log_filter(),
            store: StoreConfig::default(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are inserted verbatim and never rescanned.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    let mut cursor = 0;
    while let Some(offset) = result[cursor..].find("${") {
        let start = cursor + offset;
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = std::env::var(var_name).unwrap_or_default();
        result.replace_range(start..start + end + 1, &value);
        cursor = start + value.len();
    }
    result
}

/// Load config from an explicit path, or search the default locations.
///
/// Search order when `path` is `None`:
/// 1. `examdesk.toml` in the current directory
/// 2. `~/.config/examdesk/config.toml`
///
/// `EXAMDESK_DATA` overrides `data_path`.
pub fn load_config_from(path: Option<&Path>) -> Result<ExamdeskConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("examdesk.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let mut config = match &config_path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config_str(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => ExamdeskConfig::default(),
    };

    if let Ok(data) = std::env::var("EXAMDESK_DATA") {
        config.data_path = Some(PathBuf::from(data));
    }

    tracing::debug!(
        source = ?config_path,
        email_policy = ?config.store.email_policy,
        delete_policy = %config.store.delete_policy,
        "loaded configuration"
    );

    Ok(config)
}

/// Parse configuration TOML and resolve `${VAR}` references.
pub fn parse_config_str(content: &str) -> Result<ExamdeskConfig> {
    let mut config: ExamdeskConfig = toml::from_str(content)?;
    config.data_path = config
        .data_path
        .map(|p| PathBuf::from(resolve_env_vars(&p.to_string_lossy())));
    config.log_filter = resolve_env_vars(&config.log_filter);
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("examdesk"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_EXAMDESK_TEST_VAR", "spring");
        assert_eq!(resolve_env_vars("${_EXAMDESK_TEST_VAR}"), "spring");
        assert_eq!(
            resolve_env_vars("data/${_EXAMDESK_TEST_VAR}-term.toml"),
            "data/spring-term.toml"
        );
        std::env::remove_var("_EXAMDESK_TEST_VAR");
    }

    #[test]
    fn resolved_values_are_not_rescanned() {
        std::env::set_var("_EXAMDESK_SELF_REF", "${_EXAMDESK_SELF_REF}");
        assert_eq!(
            resolve_env_vars("a/${_EXAMDESK_SELF_REF}/b"),
            "a/${_EXAMDESK_SELF_REF}/b"
        );
        std::env::remove_var("_EXAMDESK_SELF_REF");

        assert_eq!(resolve_env_vars("${_EXAMDESK_UNSET_VAR}x${"), "x${");
    }

    #[test]
    fn default_config() {
        let config = ExamdeskConfig::default();
        assert_eq!(config.log_filter, "examdesk=info");
        assert_eq!(config.store.email_policy, EmailPolicy::Unique);
        assert_eq!(config.store.delete_policy, DeletePolicy::Cascade);
        assert!(config.data_path.is_none());
    }

    #[test]
    fn parse_store_policies() {
        let toml_str = r#"
data_path = "seed/school.toml"
log_filter = "examdesk=debug"

[store]
email_policy = "unchecked"
delete_policy = "restrict"
"#;
        let config = parse_config_str(toml_str).unwrap();
        assert_eq!(config.data_path, Some(PathBuf::from("seed/school.toml")));
        assert_eq!(config.log_filter, "examdesk=debug");
        assert_eq!(config.store.email_policy, EmailPolicy::Unchecked);
        assert_eq!(config.store.delete_policy, DeletePolicy::Restrict);
    }

    #[test]
    fn partial_config_uses_defaults() {
        let config = parse_config_str("[store]\ndelete_policy = \"orphan\"\n").unwrap();
        assert_eq!(config.store.delete_policy, DeletePolicy::Orphan);
        assert_eq!(config.store.email_policy, EmailPolicy::Unique);
        assert_eq!(config.log_filter, "examdesk=info");
    }

    #[test]
    fn unknown_policy_is_rejected() {
        assert!(parse_config_str("[store]\ndelete_policy = \"shred\"\n").is_err());
    }

    #[test]
    fn explicit_missing_path_fails() {
        let err = load_config_from(Some(Path::new("/nonexistent/examdesk.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }
}
