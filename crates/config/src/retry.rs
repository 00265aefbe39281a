//! Retry and request timeout configuration.
//!
//! Failed requests that look transient are retried with exponential
//! backoff: the n-th retry waits `base_delay_ms * 2^(n-1)`. Each individual
//! request is additionally bounded by `request_timeout_ms`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default backoff base, in milliseconds.
pub const DEFAULT_BASE_DELAY_MS: u64 = 1_000;

/// Default per-request timeout, in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Maximum allowed retries.
pub const MAX_RETRIES: u32 = 10;

/// Configuration for retries and per-request timeouts.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use ghtools_config::RetryConfig;
///
/// let config = RetryConfig::default();
/// assert_eq!(config.max_retries, 3);
/// assert_eq!(config.base_delay(), Duration::from_secs(1));
/// assert_eq!(config.request_timeout(), Duration::from_secs(30));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries allowed after the first attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff base, in milliseconds.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Upper bound for a single request, in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_base_delay_ms() -> u64 {
    DEFAULT_BASE_DELAY_MS
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl RetryConfig {
    /// Returns the backoff base as a [`Duration`].
    #[must_use]
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    /// Returns the per-request timeout as a [`Duration`].
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Validates the retry configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the retry count exceeds [`MAX_RETRIES`], or if the
    /// base delay or request timeout is zero.
    pub fn validate(&self) -> crate::Result<()> {
        let invalid = |reason: String| Err(crate::ConfigError::InvalidRetry { reason });

        if self.max_retries > MAX_RETRIES {
            return invalid(format!(
                "max retries {} exceeds maximum of {}",
                self.max_retries, MAX_RETRIES
            ));
        }
        if self.base_delay_ms == 0 {
            return invalid("base delay must be greater than zero".to_string());
        }
        if self.request_timeout_ms == 0 {
            return invalid("request timeout must be greater than zero".to_string());
        }

        Ok(())
    }
}
