//! File configuration from TOML
//!
//! Mirrors the on-disk layout of `config.toml`. Every section and field
//! has a default, so an absent file or a partial file both load cleanly.

use serde::{Deserialize, Serialize};
use solace_application::PollSettings;
use std::time::Duration;
use thiserror::Error;

/// Raw configuration as read from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// API connection (`[api]` section)
    pub api: FileApiConfig,
    /// Emotion polling cadence (`[emotion]` section)
    pub emotion: FileEmotionConfig,
    /// REPL behavior (`[repl]` section)
    pub repl: FileReplConfig,
}

/// API configuration from TOML (`[api]` section)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileApiConfig {
    /// Base URL of the consultation service
    pub base_url: String,
    /// Bearer token; the environment variable takes precedence
    pub token: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for FileApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            token: None,
            timeout_seconds: 30,
        }
    }
}

/// Emotion polling configuration from TOML (`[emotion]` section)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileEmotionConfig {
    /// Delay between poll attempts, in milliseconds
    pub poll_interval_ms: u64,
    /// Poll attempts per turn before giving up
    pub max_ticks: u32,
}

impl Default for FileEmotionConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2_000,
            max_ticks: 30,
        }
    }
}

/// REPL configuration from TOML (`[repl]` section)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileReplConfig {
    /// Path to the line-editor history file
    pub history_file: Option<String>,
    /// Colored output
    pub color: bool,
}

impl Default for FileReplConfig {
    fn default() -> Self {
        Self {
            history_file: None,
            color: true,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("api.base_url must not be empty")]
    EmptyBaseUrl,
    #[error("emotion.poll_interval_ms must be greater than zero")]
    ZeroPollInterval,
    #[error("emotion.max_ticks must be greater than zero")]
    ZeroMaxTicks,
}

impl FileConfig {
    /// Check the loaded values before wiring anything up.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigValidationError::EmptyBaseUrl);
        }
        if self.emotion.poll_interval_ms == 0 {
            return Err(ConfigValidationError::ZeroPollInterval);
        }
        if self.emotion.max_ticks == 0 {
            return Err(ConfigValidationError::ZeroMaxTicks);
        }
        Ok(())
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: Duration::from_millis(self.emotion.poll_interval_ms),
            max_ticks: self.emotion.max_ticks,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = FileConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.api.base_url, "http://localhost:8080/api");
        assert_eq!(config.poll_settings(), PollSettings::default());
    }

    #[test]
    fn partial_toml_fills_missing_fields_with_defaults() {
        let config: FileConfig = toml::from_str(
            r#"
            [api]
            base_url = "https://solace.example.com/api"

            [emotion]
            poll_interval_ms = 500
            "#,
        )
        .unwrap();
        assert_eq!(config.api.base_url, "https://solace.example.com/api");
        assert_eq!(config.api.timeout_seconds, 30);
        assert_eq!(config.emotion.poll_interval_ms, 500);
        assert_eq!(config.emotion.max_ticks, 30);
        assert!(config.repl.color);
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = FileConfig::default();
        config.api.base_url = "  ".into();
        assert_eq!(config.validate(), Err(ConfigValidationError::EmptyBaseUrl));

        let mut config = FileConfig::default();
        config.emotion.poll_interval_ms = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::ZeroPollInterval)
        );

        let mut config = FileConfig::default();
        config.emotion.max_ticks = 0;
        assert_eq!(config.validate(), Err(ConfigValidationError::ZeroMaxTicks));
    }
}
