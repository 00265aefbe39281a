//! Rate limiter configuration.
//!
//! This module provides the [`RateLimitConfig`] type which controls when
//! the client starts throttling itself against GitHub's quota window.
//!
//! # Rate Limits
//!
//! GitHub reports the remaining quota on every response. Once the remaining
//! count drops to `min_remaining` or below, callers wait until the window
//! resets (plus `reset_buffer_ms` of slack for clock skew).

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default minimum remaining requests before throttling kicks in.
pub const DEFAULT_MIN_REMAINING: u64 = 100;

/// Default slack added to the reset time, in milliseconds.
pub const DEFAULT_RESET_BUFFER_MS: u64 = 1_000;

/// Maximum allowed reset buffer (1 minute).
pub const MAX_RESET_BUFFER_MS: u64 = 60_000;

/// Configuration for the rate limiter.
///
/// # Examples
///
/// ```
/// use ghtools_config::RateLimitConfig;
///
/// let config = RateLimitConfig::default();
/// assert!(config.enabled);
/// assert_eq!(config.min_remaining, 100);
///
/// let off = RateLimitConfig::disabled();
/// assert!(!off.enabled);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Whether predictive throttling is enabled.
    ///
    /// When false, requests are never delayed before they are sent. Explicit
    /// quota rejections from GitHub are still waited out.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Throttle once the remaining quota is at or below this value.
    #[serde(default = "default_min_remaining")]
    pub min_remaining: u64,

    /// Extra time to wait past the advertised reset, in milliseconds.
    #[serde(default = "default_reset_buffer_ms")]
    pub reset_buffer_ms: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_min_remaining() -> u64 {
    DEFAULT_MIN_REMAINING
}

fn default_reset_buffer_ms() -> u64 {
    DEFAULT_RESET_BUFFER_MS
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_remaining: DEFAULT_MIN_REMAINING,
            reset_buffer_ms: DEFAULT_RESET_BUFFER_MS,
        }
    }
}

impl RateLimitConfig {
    /// Creates a configuration with predictive throttling turned off.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Returns the reset buffer as a [`Duration`].
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use ghtools_config::RateLimitConfig;
    ///
    /// let config = RateLimitConfig { reset_buffer_ms: 500, ..Default::default() };
    /// assert_eq!(config.reset_buffer(), Duration::from_millis(500));
    /// ```
    #[must_use]
    pub fn reset_buffer(&self) -> Duration {
        Duration::from_millis(self.reset_buffer_ms)
    }

    /// Validates the rate limit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the reset buffer exceeds [`MAX_RESET_BUFFER_MS`].
    pub fn validate(&self) -> crate::Result<()> {
        if self.reset_buffer_ms > MAX_RESET_BUFFER_MS {
            return Err(crate::ConfigError::InvalidRateLimit {
                reason: format!(
                    "reset buffer {}ms exceeds maximum of {}ms",
                    self.reset_buffer_ms, MAX_RESET_BUFFER_MS
                ),
            });
        }

        Ok(())
    }
}
