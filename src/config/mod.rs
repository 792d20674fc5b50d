//! Configuration management
//!
//! Cloak owns no detection logic; the detector configuration here is an
//! opaque surface handed to the external NER collaborator (which language
//! model to load, how its labels map onto entity types). Loaded from TOML
//! with `CLOAK_*` environment overrides and validated before use.

use crate::domain::{CloakError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// NER model selection for one language
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// ISO language code (e.g. `it`, `en`)
    pub lang_code: String,
    /// Model identifier understood by the external detector
    pub model_name: String,
}

/// Configuration for the external entity detector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Language used when the caller does not specify one
    #[serde(default = "default_language")]
    pub default_language: String,

    /// Model per supported language
    #[serde(default = "default_models")]
    pub models: Vec<ModelConfig>,

    /// Detector label -> entity type mapping (e.g. `PER` -> `PERSON`)
    #[serde(default = "default_label_mapping")]
    pub label_mapping: HashMap<String, String>,

    /// Detector labels dropped entirely
    #[serde(default = "default_ignore_labels")]
    pub ignore_labels: Vec<String>,

    /// Score multiplier applied to low-confidence labels
    #[serde(default = "default_low_score_multiplier")]
    pub low_score_multiplier: f32,

    /// Labels whose scores get the low-confidence multiplier
    #[serde(default = "default_low_score_labels")]
    pub low_score_labels: Vec<String>,
}

fn default_language() -> String {
    "it".to_string()
}

fn default_models() -> Vec<ModelConfig> {
    vec![ModelConfig {
        lang_code: "it".to_string(),
        model_name: "it_core_news_sm".to_string(),
    }]
}

fn default_label_mapping() -> HashMap<String, String> {
    [
        ("PER", "PERSON"),
        ("LOC", "LOCATION"),
        ("GPE", "LOCATION"),
        ("ORG", "ORGANIZATION"),
        ("DATE", "DATE_TIME"),
        ("TIME", "DATE_TIME"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn default_ignore_labels() -> Vec<String> {
    [
        "CARDINAL",
        "EVENT",
        "LANGUAGE",
        "LAW",
        "MONEY",
        "ORDINAL",
        "PERCENT",
        "PRODUCT",
        "QUANTITY",
        "WORK_OF_ART",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_low_score_multiplier() -> f32 {
    0.4
}

fn default_low_score_labels() -> Vec<String> {
    vec!["ID".to_string(), "ORG".to_string()]
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            default_language: default_language(),
            models: default_models(),
            label_mapping: default_label_mapping(),
            ignore_labels: default_ignore_labels(),
            low_score_multiplier: default_low_score_multiplier(),
            low_score_labels: default_low_score_labels(),
        }
    }
}

impl DetectorConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.default_language.is_empty() {
            return Err(CloakError::Configuration(
                "default_language must not be empty".to_string(),
            ));
        }

        if !self
            .models
            .iter()
            .any(|m| m.lang_code == self.default_language)
        {
            return Err(CloakError::Configuration(format!(
                "no model configured for default language '{}'",
                self.default_language
            )));
        }

        if !(0.0..=1.0).contains(&self.low_score_multiplier) {
            return Err(CloakError::Configuration(format!(
                "low_score_multiplier must be within [0.0, 1.0], got {}",
                self.low_score_multiplier
            )));
        }

        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Enable rolling file output in addition to the console
    #[serde(default)]
    pub file_enabled: bool,

    /// Directory for rolling log files
    #[serde(default = "default_log_path")]
    pub file_path: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_path() -> String {
    "./logs".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_enabled: false,
            file_path: default_log_path(),
        }
    }
}

/// Top-level crate configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CloakConfig {
    /// External detector parametrization
    #[serde(default)]
    pub detector: DetectorConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CloakConfig {
    /// Load configuration from a TOML file.
    ///
    /// This function:
    /// 1. Reads the TOML file
    /// 2. Parses it into `CloakConfig`
    /// 3. Applies environment variable overrides (`CLOAK_*` prefix)
    /// 4. Validates the result
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(CloakError::Configuration(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            CloakError::Configuration(format!(
                "Failed to read configuration file {}: {e}",
                path.display()
            ))
        })?;

        let mut config: CloakConfig = toml::from_str(&contents)?;
        config.apply_env_overrides()?;
        config.detector.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("CLOAK_DEFAULT_LANGUAGE") {
            self.detector.default_language = val;
        }

        if let Ok(val) = std::env::var("CLOAK_LOG_LEVEL") {
            self.logging.level = val;
        }

        if let Ok(val) = std::env::var("CLOAK_LOG_FILE_ENABLED") {
            self.logging.file_enabled = val.parse().map_err(|_| {
                CloakError::Configuration(format!("Invalid CLOAK_LOG_FILE_ENABLED value: {val}"))
            })?;
        }

        if let Ok(val) = std::env::var("CLOAK_LOG_FILE_PATH") {
            self.logging.file_path = val;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = CloakConfig::default();
        assert!(config.detector.validate().is_ok());
        assert_eq!(config.detector.default_language, "it");
        assert_eq!(config.detector.label_mapping["PER"], "PERSON");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_validate_rejects_missing_default_model() {
        let mut config = DetectorConfig::default();
        config.default_language = "de".to_string();
        assert!(matches!(
            config.validate().unwrap_err(),
            CloakError::Configuration(_)
        ));
    }

    #[test]
    fn test_validate_rejects_bad_multiplier() {
        let mut config = DetectorConfig::default();
        config.low_score_multiplier = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file_missing() {
        let err = CloakConfig::from_file("/nonexistent/cloak.toml").unwrap_err();
        assert!(matches!(err, CloakError::Configuration(_)));
    }

    #[test]
    fn test_from_file_parses_sections() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cloak.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[detector]
default_language = "it"

[logging]
level = "debug"
"#
        )
        .unwrap();

        let config = CloakConfig::from_file(&path).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.detector.default_language, "it");
    }
}
