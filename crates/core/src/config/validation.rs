//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Upper bound shared by `batch_size` and `probe_concurrency`.
const MAX_FAN_OUT: usize = 32;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    /// - `batch_size` or `probe_concurrency` is 0 or exceeds 32
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must be greater than 0".into() });
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must not exceed 50MB".into() });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "user_agent".into(),
                hint: "Set VIDSCOUT_USER_AGENT or remove the empty override".into(),
            });
        }

        for (field, value) in [("batch_size", self.batch_size), ("probe_concurrency", self.probe_concurrency)] {
            if value == 0 || value > MAX_FAN_OUT {
                return Err(ConfigError::Invalid {
                    field: field.into(),
                    reason: format!("must be between 1 and {MAX_FAN_OUT}"),
                });
            }
        }

        if !self.probe_videos && self.probe_concurrency != 4 {
            tracing::warn!(
                probe_concurrency = self.probe_concurrency,
                "probe_concurrency is set but probe_videos is disabled; value is ignored"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_max_bytes_zero() {
        let config = AppConfig { max_bytes: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "max_bytes"));
    }

    #[test]
    fn test_validate_max_bytes_exceeds_limit() {
        let config = AppConfig { max_bytes: 51 * 1024 * 1024, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "max_bytes"));
    }

    #[test]
    fn test_validate_timeout_too_small() {
        let config = AppConfig { timeout_ms: 50, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));
    }

    #[test]
    fn test_validate_timeout_exceeds_limit() {
        let config = AppConfig { timeout_ms: 301_000, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));
    }

    #[test]
    fn test_validate_empty_user_agent() {
        let config = AppConfig { user_agent: "  ".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Missing { field, .. }) if field == "user_agent"));
    }

    #[test]
    fn test_validate_batch_size_bounds() {
        let zero = AppConfig { batch_size: 0, ..Default::default() };
        assert!(matches!(zero.validate(), Err(ConfigError::Invalid { field, .. }) if field == "batch_size"));

        let huge = AppConfig { batch_size: 33, ..Default::default() };
        assert!(matches!(huge.validate(), Err(ConfigError::Invalid { field, .. }) if field == "batch_size"));
    }

    #[test]
    fn test_validate_probe_concurrency_zero() {
        let config = AppConfig { probe_concurrency: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "probe_concurrency"));
    }

    #[test]
    fn test_validate_edge_case_values() {
        let config =
            AppConfig { max_bytes: 1, timeout_ms: 100, batch_size: 1, probe_concurrency: 1, ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_max_values() {
        let config = AppConfig {
            max_bytes: 50 * 1024 * 1024,
            timeout_ms: 300_000,
            batch_size: 32,
            probe_concurrency: 32,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
