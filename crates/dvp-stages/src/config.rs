//! Verifier configuration
//!
//! Loaded once from YAML and shared read-only by every run. Every section
//! has a default, so an empty document is a valid configuration.

use dvp_core::{ErrorCode, StaticCatalog};
use dvp_match::MatchConfig;
use dvp_policy::{default_policies, PolicyError, PolicyTable, ValidityPolicy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid policy table: {0}")]
    Policy(#[from] PolicyError),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterTimeouts {
    pub ocr_timeout_ms: u64,
    pub llm_timeout_ms: u64,
}

impl Default for AdapterTimeouts {
    fn default() -> Self {
        Self {
            ocr_timeout_ms: 60_000,
            llm_timeout_ms: 30_000,
        }
    }
}

impl AdapterTimeouts {
    pub fn ocr(&self) -> Duration {
        Duration::from_millis(self.ocr_timeout_ms)
    }

    pub fn llm(&self) -> Duration {
        Duration::from_millis(self.llm_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Runs allowed in flight at once across the service
    pub max_concurrent_runs: usize,
    pub max_document_bytes: usize,
    /// Lowercase file extensions accepted by the acquire stage
    pub allowed_extensions: Vec<String>,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_concurrent_runs: 8,
            max_document_bytes: 20 * 1024 * 1024,
            allowed_extensions: ["pdf", "jpg", "jpeg", "png", "tif", "tiff", "heic"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    pub matching: MatchConfig,
    pub policies: Vec<ValidityPolicy>,
    /// Overrides for the built-in message catalog
    pub messages: HashMap<ErrorCode, String>,
    pub adapters: AdapterTimeouts,
    pub limits: Limits,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            matching: MatchConfig::default(),
            policies: default_policies(),
            messages: HashMap::new(),
            adapters: AdapterTimeouts::default(),
            limits: Limits::default(),
        }
    }
}

impl VerifierConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: VerifierConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.matching.fuzzy_threshold > 100 {
            return Err(ConfigError::Invalid(format!(
                "fuzzy_threshold must be within 0..=100, got {}",
                self.matching.fuzzy_threshold
            )));
        }
        if self.limits.max_concurrent_runs == 0 {
            return Err(ConfigError::Invalid(
                "max_concurrent_runs must be at least 1".to_string(),
            ));
        }
        if self.limits.max_document_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_document_bytes must be at least 1".to_string(),
            ));
        }
        if self.adapters.ocr_timeout_ms == 0 || self.adapters.llm_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "adapter timeouts must be non-zero".to_string(),
            ));
        }
        self.policy_table()?;
        Ok(())
    }

    pub fn policy_table(&self) -> Result<PolicyTable, ConfigError> {
        Ok(PolicyTable::new(self.policies.clone())?)
    }

    pub fn catalog(&self) -> StaticCatalog {
        StaticCatalog::with_messages(self.messages.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_is_default() {
        let config = VerifierConfig::from_yaml("{}").unwrap();
        assert_eq!(config.matching, MatchConfig::default());
        assert_eq!(config.policies, default_policies());
        assert_eq!(config.limits.max_concurrent_runs, 8);
    }

    #[test]
    fn test_partial_sections() {
        let config = VerifierConfig::from_yaml(
            r#"
matching:
  fuzzy_threshold: 90
limits:
  max_concurrent_runs: 2
messages:
  FIO_MISMATCH: "Name does not match"
"#,
        )
        .unwrap();
        assert_eq!(config.matching.fuzzy_threshold, 90);
        assert!(config.matching.allow_fuzzy_fallback);
        assert_eq!(config.limits.max_concurrent_runs, 2);
        assert_eq!(config.limits.max_document_bytes, Limits::default().max_document_bytes);
        assert_eq!(
            dvp_core::MessageCatalog::lookup(&config.catalog(), ErrorCode::FioMismatch),
            "Name does not match"
        );
    }

    #[test]
    fn test_rejects_bad_threshold() {
        let err = VerifierConfig::from_yaml("matching:\n  fuzzy_threshold: 150\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_zero_concurrency() {
        let err = VerifierConfig::from_yaml("limits:\n  max_concurrent_runs: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_inverted_policy() {
        let err = VerifierConfig::from_yaml(
            "policies:\n  - document_type_key: x\n    min_age_days: 10\n    max_age_days: 5\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Policy(_)));
    }

    #[test]
    fn test_unknown_message_code_rejected() {
        assert!(matches!(
            VerifierConfig::from_yaml("messages:\n  NOT_A_CODE: x\n"),
            Err(ConfigError::Yaml(_))
        ));
    }
}
