//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (VIDSCOUT_*)
//! 2. TOML config file (if VIDSCOUT_CONFIG_FILE set)
//! 3. Built-in defaults

use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (VIDSCOUT_*)
/// 2. TOML config file (if VIDSCOUT_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// User-Agent string for HTTP requests.
    ///
    /// Set via VIDSCOUT_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP timeout in milliseconds, applied to page fetches and video probes.
    ///
    /// Set via VIDSCOUT_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum bytes to fetch per page.
    ///
    /// Set via VIDSCOUT_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Maximum number of redirects to follow.
    ///
    /// Set via VIDSCOUT_MAX_REDIRECTS environment variable.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Number of URLs analyzed concurrently in batch mode.
    ///
    /// Set via VIDSCOUT_BATCH_SIZE environment variable.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Whether to probe every discovered video URL for accessibility.
    ///
    /// Set via VIDSCOUT_PROBE_VIDEOS environment variable.
    #[serde(default = "default_true")]
    pub probe_videos: bool,

    /// Maximum concurrent accessibility probes within one analysis.
    ///
    /// Set via VIDSCOUT_PROBE_CONCURRENCY environment variable.
    #[serde(default = "default_probe_concurrency")]
    pub probe_concurrency: usize,
}

fn default_user_agent() -> String {
    concat!("vidscout/", env!("CARGO_PKG_VERSION")).into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_max_redirects() -> usize {
    5
}

fn default_batch_size() -> usize {
    5
}

fn default_true() -> bool {
    true
}

fn default_probe_concurrency() -> usize {
    4
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
            max_redirects: default_max_redirects(),
            batch_size: default_batch_size(),
            probe_videos: true,
            probe_concurrency: default_probe_concurrency(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `VIDSCOUT_`
    /// 2. TOML file from `VIDSCOUT_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("VIDSCOUT_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("VIDSCOUT_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
