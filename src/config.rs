//! Configuration for HeartRisk.
//!
//! Settings come from environment variables (optionally seeded from a
//! `.env` file) with defaults for everything.
//!
//! # Environment Variables
//!
//! - `HEARTRISK_MODEL_PATH`: network file - default: `models/heart_disease_model.json`
//! - `HEARTRISK_TARGET`: outcome variable - default: `target`
//! - `HEARTRISK_POSITIVE_STATE`: disease-present state - default: `Heart-Disease`
//! - `HEARTRISK_ALIAS_POLICY`: `pass_through` or `strict` - default: `pass_through`
//! - `HEARTRISK_LOG_LEVEL`: logging level - default: `info`

use std::env;
use std::path::PathBuf;

use thiserror::Error;

use crate::inference::DEFAULT_TARGET;
use crate::risk::DEFAULT_POSITIVE_STATE;
use crate::vocabulary::AliasPolicy;

const DEFAULT_MODEL_PATH: &str = "models/heart_disease_model.json";
const DEFAULT_LOG_LEVEL: &str = "info";
const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse configuration value
    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },

    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskConfig {
    /// Network file to load at startup.
    pub model_path: PathBuf,

    /// Outcome variable to query.
    pub target: String,

    /// Disease-present state of the outcome variable.
    pub positive_state: String,

    /// Handling of unrecognized values for known fields.
    pub alias_policy: AliasPolicy,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            target: DEFAULT_TARGET.to_string(),
            positive_state: DEFAULT_POSITIVE_STATE.to_string(),
            alias_policy: AliasPolicy::default(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl RiskConfig {
    /// Loads configuration from the process environment, reading `.env` first if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable has an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is normal.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a value is invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let alias_policy = match lookup("HEARTRISK_ALIAS_POLICY") {
            Some(raw) => raw.parse::<AliasPolicy>().map_err(|error| ConfigError::ParseError {
                field: "HEARTRISK_ALIAS_POLICY".to_string(),
                error,
            })?,
            None => defaults.alias_policy,
        };

        let config = Self {
            model_path: lookup("HEARTRISK_MODEL_PATH").map_or(defaults.model_path, PathBuf::from),
            target: lookup("HEARTRISK_TARGET").unwrap_or(defaults.target),
            positive_state: lookup("HEARTRISK_POSITIVE_STATE").unwrap_or(defaults.positive_state),
            alias_policy,
            log_level: lookup("HEARTRISK_LOG_LEVEL")
                .map_or(defaults.log_level, |l| l.trim().to_lowercase()),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` for empty names or an unknown log level.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model_path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "model path cannot be empty".to_string(),
            ));
        }
        if self.target.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "target variable cannot be empty".to_string(),
            ));
        }
        if self.positive_state.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "positive state cannot be empty".to_string(),
            ));
        }
        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::ValidationFailed(format!(
                "invalid log level '{}'. Valid levels: {}",
                self.log_level,
                VALID_LOG_LEVELS.join(", ")
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RiskConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, RiskConfig::default());
        assert_eq!(config.target, "target");
        assert_eq!(config.positive_state, "Heart-Disease");
        assert_eq!(config.alias_policy, AliasPolicy::PassThrough);
    }

    #[test]
    fn test_overrides() {
        let config = RiskConfig::from_lookup(lookup_from(&[
            ("HEARTRISK_MODEL_PATH", "/srv/model.json"),
            ("HEARTRISK_ALIAS_POLICY", "strict"),
            ("HEARTRISK_LOG_LEVEL", "DEBUG"),
        ]))
        .unwrap();
        assert_eq!(config.model_path, PathBuf::from("/srv/model.json"));
        assert_eq!(config.alias_policy, AliasPolicy::Strict);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_invalid_alias_policy() {
        let err = RiskConfig::from_lookup(lookup_from(&[("HEARTRISK_ALIAS_POLICY", "loose")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_invalid_log_level() {
        let err = RiskConfig::from_lookup(lookup_from(&[("HEARTRISK_LOG_LEVEL", "loud")]))
            .unwrap_err();
        assert!(err.to_string().contains("invalid log level"));
    }

    #[test]
    fn test_empty_target_rejected() {
        let config = RiskConfig {
            target: " ".to_string(),
            ..RiskConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
