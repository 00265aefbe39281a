//! Core configuration struct and loading logic.
//!
//! This module provides the main [`Config`] struct which aggregates all
//! configuration options for ghtools.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::persistence::{find_config_file, read_config_file};
use crate::rate_limit::RateLimitConfig;
use crate::retry::RetryConfig;

/// Environment variable overriding [`Config::github_token`].
pub const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";
/// Environment variable overriding [`RateLimitConfig::enabled`].
pub const ENV_RATE_LIMIT_ENABLED: &str = "GHTOOLS_RATE_LIMIT_ENABLED";
/// Environment variable overriding [`RateLimitConfig::min_remaining`].
pub const ENV_MIN_REMAINING: &str = "GHTOOLS_MIN_REMAINING";
/// Environment variable overriding [`RateLimitConfig::reset_buffer_ms`].
pub const ENV_RESET_BUFFER_MS: &str = "GHTOOLS_RESET_BUFFER_MS";
/// Environment variable overriding [`RetryConfig::max_retries`].
pub const ENV_MAX_RETRIES: &str = "GHTOOLS_MAX_RETRIES";
/// Environment variable overriding [`RetryConfig::base_delay_ms`].
pub const ENV_BASE_DELAY_MS: &str = "GHTOOLS_BASE_DELAY_MS";
/// Environment variable overriding [`RetryConfig::request_timeout_ms`].
pub const ENV_REQUEST_TIMEOUT_MS: &str = "GHTOOLS_REQUEST_TIMEOUT_MS";

/// The main configuration struct for ghtools.
///
/// # Examples
///
/// ```
/// use ghtools_config::{Config, RateLimitConfig, RetryConfig};
///
/// // Create a default config
/// let config = Config::default();
/// assert!(config.github_token.is_none());
///
/// // Create a custom config
/// let config = Config {
///     github_token: Some("ghp_xxx".to_string()),
///     rate_limit: RateLimitConfig::disabled(),
///     retry: RetryConfig { max_retries: 5, ..Default::default() },
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// GitHub token used as the bearer credential.
    ///
    /// If not set, the application will try to get a token from the `gh` CLI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_token: Option<String>,

    /// Rate limiter settings.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Retry and timeout settings.
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Config {
    /// Creates a new default configuration.
    ///
    /// This is equivalent to `Config::default()`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from the default file locations and the
    /// environment.
    ///
    /// Searches for a configuration file (see
    /// [`find_config_file`](crate::persistence::find_config_file)), falls
    /// back to defaults when none exists, then applies `GHTOOLS_*` and
    /// `GITHUB_TOKEN` environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is found but cannot be
    /// read or parsed, if an environment override cannot be parsed, or if
    /// the result fails validation.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ghtools_config::Config;
    ///
    /// # async fn example() -> ghtools_config::Result<()> {
    /// let config = Config::load().await?;
    /// println!("Retrying up to {} times", config.retry.max_retries);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn load() -> Result<Self> {
        let mut config = match find_config_file() {
            Some(path) => read_config_file(&path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a specific file, ignoring the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// configuration is invalid.
    pub fn load_from(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let config: Config = read_config_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies environment overrides using the given variable lookup.
    ///
    /// Unset variables leave the current value untouched. Empty values are
    /// treated as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnvVar`] if a set variable cannot be
    /// parsed.
    ///
    /// # Examples
    ///
    /// ```
    /// use ghtools_config::Config;
    ///
    /// let mut config = Config::default();
    /// config
    ///     .apply_env_overrides(|name| match name {
    ///         "GHTOOLS_MAX_RETRIES" => Some("5".to_string()),
    ///         "GHTOOLS_RATE_LIMIT_ENABLED" => Some("false".to_string()),
    ///         _ => None,
    ///     })
    ///     .unwrap();
    ///
    /// assert_eq!(config.retry.max_retries, 5);
    /// assert!(!config.rate_limit.enabled);
    /// ```
    pub fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<()> {
        let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(token) = lookup(ENV_GITHUB_TOKEN) {
            self.github_token = Some(token.trim().to_string());
        }
        if let Some(raw) = lookup(ENV_RATE_LIMIT_ENABLED) {
            self.rate_limit.enabled = parse_bool(ENV_RATE_LIMIT_ENABLED, &raw)?;
        }
        if let Some(raw) = lookup(ENV_MIN_REMAINING) {
            self.rate_limit.min_remaining = parse_env(ENV_MIN_REMAINING, &raw)?;
        }
        if let Some(raw) = lookup(ENV_RESET_BUFFER_MS) {
            self.rate_limit.reset_buffer_ms = parse_env(ENV_RESET_BUFFER_MS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_MAX_RETRIES) {
            self.retry.max_retries = parse_env(ENV_MAX_RETRIES, &raw)?;
        }
        if let Some(raw) = lookup(ENV_BASE_DELAY_MS) {
            self.retry.base_delay_ms = parse_env(ENV_BASE_DELAY_MS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT_MS) {
            self.retry.request_timeout_ms = parse_env(ENV_REQUEST_TIMEOUT_MS, &raw)?;
        }

        Ok(())
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the rate limit or retry settings are invalid.
    pub fn validate(&self) -> Result<()> {
        self.rate_limit.validate()?;
        self.retry.validate()?;
        Ok(())
    }
}

fn invalid_env(name: &str, raw: &str) -> ConfigError {
    ConfigError::InvalidEnvVar {
        name: name.to_string(),
        value: raw.to_string(),
    }
}

fn parse_env<T: FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim().parse().map_err(|_| invalid_env(name, raw))
}

fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid_env(name, raw)),
    }
}
