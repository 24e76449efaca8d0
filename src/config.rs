//! Pipeline Configuration
//!
//! One [`IntegrityConfig`] carries the validator policy, rating table and
//! store settings. Sources, later ones winning:
//!
//! 1. built-in defaults
//! 2. JSON file named by `INTEGRITY_CONFIG` (missing keys keep defaults)
//! 3. individual `INTEGRITY_*` variables

use std::path::Path;
use std::str::FromStr;

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::proof::StoreConfig;
use crate::rating::RatingTable;
use crate::validator::ValidatorPolicy;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// Config file is not valid JSON for this schema.
    #[error("invalid config file: {0}")]
    Json(#[from] serde_json::Error),
    /// An environment variable did not parse.
    #[error("invalid value for {var}: {value:?}")]
    InvalidValue {
        /// Variable name.
        var: &'static str,
        /// Raw value.
        value: String,
    },
    /// Values parsed but violate a structural constraint.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Full pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrityConfig {
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// Validator limits and penalties.
    pub validator: ValidatorPolicy,
    /// Fairness tiers.
    pub rating: RatingTable,
    /// Commitment store settings.
    pub store: StoreConfig,
}

impl Default for IntegrityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            validator: ValidatorPolicy::default(),
            rating: RatingTable::default(),
            store: StoreConfig::default(),
        }
    }
}

impl IntegrityConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Parse JSON config text.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.check()?;
        Ok(config)
    }

    /// Build config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup("INTEGRITY_CONFIG") {
            Some(path) => Self::from_json_file(path)?,
            None => Self::default(),
        };

        if let Some(level) = lookup("INTEGRITY_LOG_LEVEL") {
            config.log_level = level;
        }

        let policy = &mut config.validator;
        override_with(&lookup, "INTEGRITY_SUSPICION_THRESHOLD", &mut policy.suspicion_threshold)?;
        override_with(&lookup, "INTEGRITY_ERROR_PENALTY", &mut policy.error_penalty)?;
        override_with(&lookup, "INTEGRITY_WARNING_PENALTY", &mut policy.warning_penalty)?;
        override_with(&lookup, "INTEGRITY_MIN_HISTORY", &mut policy.min_history_for_statistics)?;
        override_with(&lookup, "INTEGRITY_Z_THRESHOLD", &mut policy.z_score_threshold)?;

        override_with(&lookup, "INTEGRITY_PENDING_TIMEOUT_SECS", &mut config.store.pending_timeout_secs)?;
        if let Some(value) = lookup("INTEGRITY_ATTEST_FULL_RECORD") {
            config.store.attest_full_record = parse_flag("INTEGRITY_ATTEST_FULL_RECORD", &value)?;
        }

        config.check()?;
        Ok(config)
    }

    /// Check structural constraints.
    pub fn check(&self) -> Result<(), ConfigError> {
        self.validator.check().map_err(ConfigError::Invalid)
    }
}

fn override_with<F, T>(lookup: &F, var: &'static str, target: &mut T) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(value) = lookup(var) {
        *target = value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { var, value })?;
    }
    Ok(())
}

fn parse_flag(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim() {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            value: value.to_string(),
        }),
    }
}
