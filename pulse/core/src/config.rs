//! Client Configuration
//!
//! Settings come from four layers, highest priority first:
//! 1. CLI arguments ([`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML file at `$XDG_CONFIG_HOME/gaiapulse/config.toml`
//! 4. Defaults
//!
//! # Example Configuration
//!
//! ```toml
//! [api]
//! base_url = "http://localhost:8000"
//! request_timeout_ms = 5000
//!
//! [polling]
//! interval_secs = 20
//! stale_after_secs = 10
//! history_days = 30
//!
//! [polling.retry]
//! max_retries = 2
//!
//! [chat.retry]
//! max_retries = 3
//! max_delay_ms = 30000
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::monitor::MonitorConfig;
use crate::polling::{PollConfig, RetryPolicy};

/// Production deployment of the GaiaPulse API
pub const DEFAULT_BASE_URL: &str = "https://gaiapulse-ibm-hack25-production.up.railway.app";

/// Per-request timeout when nothing else is configured
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Environment variable overriding the base URL
pub const ENV_API_URL: &str = "GAIAPULSE_API_URL";

/// Environment variable overriding the request timeout
pub const ENV_TIMEOUT_MS: &str = "GAIAPULSE_TIMEOUT_MS";

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// A value is present but unusable
    #[error("invalid configuration: {0}")]
    ValidationError(String),
}

/// Where the effective configuration was last changed from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Command-line argument
    Cli,
    /// Environment variable
    Env,
    /// TOML configuration file
    File,
    /// Built-in default
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

/// Connection settings for the HTTP transport
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Scheme and host of the API, without a trailing slash
    pub base_url: String,
    /// Timeout applied to every request
    pub request_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `GAIAPULSE_API_URL` and `GAIAPULSE_TIMEOUT_MS`
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Request timeout as a duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Apply overrides from an environment lookup; returns whether anything changed
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> bool {
        let mut changed = false;
        if let Some(url) = lookup(ENV_API_URL).filter(|u| !u.trim().is_empty()) {
            self.base_url = url.trim().to_string();
            changed = true;
        }
        if let Some(timeout) = lookup(ENV_TIMEOUT_MS) {
            match timeout.parse::<u64>() {
                Ok(ms) if ms > 0 => {
                    self.request_timeout_ms = ms;
                    changed = true;
                }
                _ => tracing::warn!(value = %timeout, "Ignoring invalid {}", ENV_TIMEOUT_MS),
            }
        }
        changed
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// `[api]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiToml {
    /// Base URL override
    pub base_url: Option<String>,
    /// Request timeout in milliseconds
    pub request_timeout_ms: Option<u64>,
}

/// `[polling]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingToml {
    /// Seconds between polls
    pub interval_secs: Option<u64>,
    /// Seconds after which a value counts as stale
    pub stale_after_secs: Option<u64>,
    /// History window in days
    pub history_days: Option<i64>,
    /// Backoff for failed polls
    pub retry: Option<RetryPolicy>,
}

/// `[chat]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatToml {
    /// Backoff for failed sends
    pub retry: Option<RetryPolicy>,
}

/// Root of the TOML configuration file
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PulseToml {
    /// API connection
    pub api: ApiToml,
    /// Mood and history polling
    pub polling: PollingToml,
    /// Chat sending
    pub chat: ChatToml,
}

// =============================================================================
// Resolved Configuration
// =============================================================================

/// Effective configuration after merging every layer
#[derive(Clone, Debug, PartialEq)]
pub struct PulseConfig {
    /// HTTP transport settings
    pub client: ClientConfig,
    /// Polling settings for both feeds
    pub monitor: MonitorConfig,
    /// Backoff for chat sends
    pub chat_retry: RetryPolicy,
    /// File the configuration was read from, if any
    pub config_file_path: Option<PathBuf>,
    source: ConfigSource,
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            monitor: MonitorConfig::default(),
            chat_retry: RetryPolicy::chat_send(),
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl PulseConfig {
    /// Highest-priority layer that changed a value
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.client.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError("base_url must not be empty".into()));
        }
        if self.client.request_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "request_timeout_ms must be positive".into(),
            ));
        }
        if self.monitor.history_days <= 0 {
            return Err(ConfigError::ValidationError(format!(
                "history_days must be positive, got {}",
                self.monitor.history_days
            )));
        }
        for feed in [&self.monitor.mood, &self.monitor.history] {
            if feed.interval.is_zero() {
                return Err(ConfigError::ValidationError(
                    "interval_secs must be positive".into(),
                ));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Default configuration file path
///
/// `$XDG_CONFIG_HOME/gaiapulse/config.toml`, typically
/// `~/.config/gaiapulse/config.toml`.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("gaiapulse").join("config.toml"))
}

/// Load defaults, the default config file, and the environment
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or if
/// the merged values are unusable. A missing file is not an error.
pub fn load_config() -> Result<PulseConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific file
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed, or if
/// the merged values are unusable.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<PulseConfig, ConfigError> {
    load_with_env(path, |key| std::env::var(key).ok())
}

fn load_with_env(
    path: Option<PathBuf>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<PulseConfig, ConfigError> {
    let mut config = PulseConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: PulseToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(path = %config_path.display(), "Loaded configuration from file");
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    if config.client.apply_env(lookup) {
        config.source = ConfigSource::Env;
    }

    config.validate()?;
    Ok(config)
}

fn apply_toml_config(config: &mut PulseConfig, toml: &PulseToml) {
    if let Some(ref url) = toml.api.base_url {
        config.client.base_url = url.trim().to_string();
    }
    if let Some(timeout) = toml.api.request_timeout_ms {
        config.client.request_timeout_ms = timeout;
    }

    let polling = &toml.polling;
    for feed in [&mut config.monitor.mood, &mut config.monitor.history] {
        apply_poll_toml(feed, polling);
    }
    if let Some(days) = polling.history_days {
        config.monitor.history_days = days;
    }

    if let Some(retry) = toml.chat.retry {
        config.chat_retry = retry;
    }
}

fn apply_poll_toml(feed: &mut PollConfig, polling: &PollingToml) {
    if let Some(secs) = polling.interval_secs {
        feed.interval = Duration::from_secs(secs);
    }
    if let Some(secs) = polling.stale_after_secs {
        feed.stale_after = Duration::from_secs(secs);
    }
    if let Some(retry) = polling.retry {
        feed.retry = retry;
    }
}

// =============================================================================
// CLI Overrides
// =============================================================================

/// Values given on the command line
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Base URL override
    pub base_url: Option<String>,
    /// History window override
    pub history_days: Option<i64>,
    /// Poll interval override in seconds
    pub interval_secs: Option<u64>,
}

impl ConfigOverrides {
    /// Empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set base URL override
    #[must_use]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Set history window override
    #[must_use]
    pub fn with_history_days(mut self, days: i64) -> Self {
        self.history_days = Some(days);
        self
    }

    /// Set poll interval override
    #[must_use]
    pub fn with_interval_secs(mut self, secs: u64) -> Self {
        self.interval_secs = Some(secs);
        self
    }

    /// Apply overrides on top of a loaded configuration
    ///
    /// # Errors
    ///
    /// Returns an error if an override makes the configuration unusable.
    pub fn apply(&self, config: &mut PulseConfig) -> Result<(), ConfigError> {
        if self.base_url.is_some() || self.history_days.is_some() || self.interval_secs.is_some() {
            config.source = ConfigSource::Cli;
        }

        if let Some(ref url) = self.base_url {
            config.client.base_url = url.trim().to_string();
        }
        if let Some(days) = self.history_days {
            config.monitor.history_days = days;
        }
        if let Some(secs) = self.interval_secs {
            config.monitor.mood.interval = Duration::from_secs(secs);
            config.monitor.history.interval = Duration::from_secs(secs);
        }

        config.validate()
    }
}
