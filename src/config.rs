//! Configuration - Per-Context Limits
//!
//! Loaded from a JSON file. Every field has a default, so a partial file
//! (or none at all) is valid.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sanitize::ADMIN_INPUT_LIMIT;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormsConfig {
    /// Cap for free text on the sign-in and sign-up forms. Unbounded by default.
    #[serde(default)]
    pub auth_input_limit: Option<usize>,
    /// Cap for free text on the admin product form.
    #[serde(default = "default_admin_input_limit")]
    pub admin_input_limit: usize,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

fn default_admin_input_limit() -> usize { ADMIN_INPUT_LIMIT }

impl Default for FormsConfig {
    fn default() -> Self {
        Self {
            auth_input_limit: None,
            admin_input_limit: default_admin_input_limit(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
}

fn default_max_attempts() -> usize { 5 }
fn default_window_ms() -> u64 { 60_000 }

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            window_ms: default_window_ms(),
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

impl FormsConfig {
    /// Load from `path`. A missing file means defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content)?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.admin_input_limit == 0 {
            return Err(ConfigError::Invalid("adminInputLimit must be positive".into()));
        }
        if self.auth_input_limit == Some(0) {
            return Err(ConfigError::Invalid("authInputLimit must be positive".into()));
        }
        if self.rate_limit.max_attempts == 0 {
            return Err(ConfigError::Invalid("rateLimit.maxAttempts must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = FormsConfig::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, FormsConfig::default());
        assert_eq!(config.admin_input_limit, 5000);
        assert_eq!(config.auth_input_limit, None);
        assert_eq!(config.rate_limit.window(), Duration::from_secs(60));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"authInputLimit": 200, "rateLimit": {{"maxAttempts": 3}}}}"#).unwrap();

        let config = FormsConfig::load(file.path()).unwrap();
        assert_eq!(config.auth_input_limit, Some(200));
        assert_eq!(config.admin_input_limit, 5000);
        assert_eq!(config.rate_limit.max_attempts, 3);
        assert_eq!(config.rate_limit.window_ms, 60_000);
    }

    #[test]
    fn malformed_json_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        assert!(matches!(FormsConfig::load(file.path()), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn zero_limits_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"adminInputLimit": 0}}"#).unwrap();
        assert!(matches!(FormsConfig::load(file.path()), Err(ConfigError::Invalid(_))));
    }
}
