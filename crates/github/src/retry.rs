//! Retrying remote calls with exponential backoff.
//!
//! [`RetryExecutor::execute`] wraps a single remote call. Every attempt is
//! admitted by the shared [`RateLimiter`] first, and every successful
//! response feeds its quota headers back into it.
//!
//! Failures are split into two kinds:
//!
//! - **Transient**: `5xx` responses and quota rejections (`429`, or `403`
//!   mentioning the rate limit). These are retried up to
//!   [`RetryPolicy::max_retries`] times.
//! - **Terminal**: everything else, including failures that never produced
//!   a response. These surface immediately.
//!
//! Quota rejections wait as long as GitHub asks (see
//! [`RateLimiter::handle_rate_limit_exceeded`]); other transient failures
//! wait `base_delay * 2^attempt`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use ghtools_config::RetryConfig;
use tracing::{debug, instrument, warn};

use crate::api::{ApiResponse, RemoteError};
use crate::error::{Error, Result};
use crate::rate_limit::RateLimiter;
use crate::timeout::{SafeTimeout, TimeoutOutcome};

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default delay before the first retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// How many times, and how patiently, a call is retried.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use ghtools_github::RetryPolicy;
///
/// let policy = RetryPolicy::new(3, Duration::from_millis(100));
/// assert_eq!(policy.backoff(0), Duration::from_millis(100));
/// assert_eq!(policy.backoff(1), Duration::from_millis(200));
/// assert_eq!(policy.backoff(2), Duration::from_millis(400));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubled on each subsequent one.
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy.
    #[must_use]
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Creates a policy from the retry settings of a [`RetryConfig`].
    #[must_use]
    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_retries, config.base_delay())
    }

    /// Returns the delay after the failure of zero-based `attempt`.
    ///
    /// Saturates instead of overflowing for very large attempts.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, DEFAULT_BASE_DELAY)
    }
}

/// Runs remote calls under the shared rate limiter, retrying transient
/// failures.
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    limiter: Arc<RateLimiter>,
}

impl RetryExecutor {
    /// Creates an executor bound to `limiter`.
    #[must_use]
    pub fn new(limiter: Arc<RateLimiter>) -> Self {
        Self { limiter }
    }

    /// Returns the shared rate limiter.
    #[must_use]
    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Runs `call` until it succeeds, fails terminally, or exhausts
    /// `policy`.
    ///
    /// `call` is invoked at most `policy.max_retries + 1` times. A fresh
    /// future is created for every attempt.
    ///
    /// # Errors
    ///
    /// - [`Error::Remote`] for terminal failures, or the last transient
    ///   failure once retries are exhausted
    /// - [`Error::RateLimited`] if the limiter refuses to wait
    /// - [`Error::Cancelled`] if a wait is aborted by shutdown
    #[instrument(skip(self, policy, call), fields(max_retries = policy.max_retries))]
    pub async fn execute<T, F, Fut>(
        &self,
        operation: &str,
        policy: &RetryPolicy,
        mut call: F,
    ) -> Result<ApiResponse<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<ApiResponse<T>, RemoteError>>,
    {
        let mut attempt: u32 = 0;

        loop {
            self.limiter.check_rate_limit().await?;

            let failure = match call().await {
                Ok(response) => {
                    self.limiter.update_from_headers(&response.headers).await;
                    debug!(attempt, status = response.status, "call succeeded");
                    return Ok(response);
                }
                Err(failure) => failure,
            };

            if !failure.is_transient() || attempt >= policy.max_retries {
                debug!(attempt, error = %failure, "giving up");
                return Err(Error::Remote {
                    operation: operation.to_string(),
                    attempts: attempt + 1,
                    source: failure,
                });
            }

            if failure.is_quota_exceeded() {
                warn!(attempt, error = %failure, "quota exceeded, deferring to rate limiter");
                self.limiter
                    .handle_rate_limit_exceeded(failure.retry_after())
                    .await?;
            } else {
                let delay = policy.backoff(attempt);
                warn!(attempt, delay = ?delay, error = %failure, "transient failure, backing off");
                self.backoff(delay).await?;
            }

            attempt += 1;
        }
    }

    async fn backoff(&self, delay: Duration) -> Result<()> {
        let label = "retry backoff";
        match SafeTimeout::with_parent(delay, label, self.limiter.shutdown_token())
            .wait()
            .await
        {
            TimeoutOutcome::Elapsed => Ok(()),
            TimeoutOutcome::Cancelled => Err(Error::Cancelled {
                label: label.to_string(),
            }),
        }
    }
}
