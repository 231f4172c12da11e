//! Configuration loading and representation.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_ID_STRATEGY: &str = "ROLEGATE_ID_STRATEGY";
pub const ENV_ROLE_CHECK_CONCURRENCY: &str = "ROLEGATE_ROLE_CHECK_CONCURRENCY";
pub const ENV_LOG: &str = "ROLEGATE_LOG";

/// How in-memory stores allocate record identifiers.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdStrategy {
    /// 1, 2, 3, ... per store (deterministic; the default).
    #[default]
    Sequential,
    /// UUIDv7 strings.
    Uuid,
}

impl FromStr for IdStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(IdStrategy::Sequential),
            "uuid" => Ok(IdStrategy::Uuid),
            _ => Err(ConfigError::invalid(ENV_ID_STRATEGY, s)),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: String, value: String },
}

impl ConfigError {
    fn invalid(key: &str, value: &str) -> Self {
        Self::Invalid {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

/// Runtime settings for the role engine and its in-memory backends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RolegateConfig {
    pub id_strategy: IdStrategy,
    /// Upper bound on concurrent mapping lookups inside `get_roles`.
    pub role_check_concurrency: usize,
    /// `tracing` filter directive used when `RUST_LOG` is not set.
    pub log_filter: String,
}

impl Default for RolegateConfig {
    fn default() -> Self {
        Self {
            id_strategy: IdStrategy::default(),
            role_check_concurrency: 16,
            log_filter: "info".to_string(),
        }
    }
}

impl RolegateConfig {
    /// Load from `ROLEGATE_*` environment variables, defaulting unset ones.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (env, file-backed map, test fixture).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_ID_STRATEGY) {
            config.id_strategy = raw.parse()?;
        }
        if let Some(raw) = lookup(ENV_ROLE_CHECK_CONCURRENCY) {
            config.role_check_concurrency = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid(ENV_ROLE_CHECK_CONCURRENCY, &raw))?;
        }
        if let Some(raw) = lookup(ENV_LOG) {
            config.log_filter = raw;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.role_check_concurrency == 0 {
            return Err(ConfigError::invalid(ENV_ROLE_CHECK_CONCURRENCY, "0"));
        }
        if !rolegate_observability::is_valid_filter(&self.log_filter) {
            return Err(ConfigError::invalid(ENV_LOG, &self.log_filter));
        }
        Ok(())
    }

    /// Install the process-wide JSON subscriber with `log_filter` as the
    /// default directive. `RUST_LOG` still wins. Later calls are no-ops.
    pub fn init_tracing(&self) {
        rolegate_observability::init_with_filter(&self.log_filter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = RolegateConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, RolegateConfig::default());
    }

    #[test]
    fn reads_overrides() {
        let config = RolegateConfig::from_lookup(lookup(&[
            (ENV_ID_STRATEGY, "UUID"),
            (ENV_ROLE_CHECK_CONCURRENCY, "4"),
            (ENV_LOG, "rolegate_infra=debug"),
        ]))
        .unwrap();
        assert_eq!(config.id_strategy, IdStrategy::Uuid);
        assert_eq!(config.role_check_concurrency, 4);
        assert_eq!(config.log_filter, "rolegate_infra=debug");
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(RolegateConfig::from_lookup(lookup(&[(ENV_ID_STRATEGY, "random")])).is_err());
        assert!(RolegateConfig::from_lookup(lookup(&[(ENV_ROLE_CHECK_CONCURRENCY, "0")])).is_err());
        assert!(RolegateConfig::from_lookup(lookup(&[(ENV_ROLE_CHECK_CONCURRENCY, "many")])).is_err());

        let err = RolegateConfig::from_lookup(lookup(&[(ENV_LOG, "[[nope")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: ENV_LOG.to_string(),
                value: "[[nope".to_string(),
            }
        );
    }

    #[test]
    fn log_filter_drives_tracing_setup() {
        let config = RolegateConfig::from_lookup(lookup(&[(ENV_LOG, "rolegate_infra=trace")])).unwrap();
        config.validate().unwrap();
        config.init_tracing();
        config.init_tracing();
        tracing::debug!(filter = %config.log_filter, "tracing initialized from config");
    }

    #[test]
    fn deserializes_partial_documents() {
        let config: RolegateConfig =
            serde_json::from_value(serde_json::json!({"id_strategy": "uuid"})).unwrap();
        assert_eq!(config.id_strategy, IdStrategy::Uuid);
        assert_eq!(config.role_check_concurrency, 16);
    }
}
