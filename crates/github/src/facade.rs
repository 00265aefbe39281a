//! The boundary every tool call goes through.
//!
//! [`RemoteOperations`] runs a remote call through the shared
//! [`RetryExecutor`] and folds whatever comes back into an
//! [`OperationResult`]. Nothing escapes as an `Err` or a panic: failures are
//! logged and reported as a classified [`StandardizedError`].
//!
//! Failures with an HTTP status are classified by status and variant. A
//! call that never got a response carries only a message, and that message
//! is classified with [`classify_message`], which may yield `UNKNOWN`.
//!
//! [`classify_message`]: ghtools_protocol::classify_message
//! [`StandardizedError`]: ghtools_protocol::StandardizedError

use std::future::Future;
use std::sync::Arc;

use ghtools_config::Config;
use ghtools_protocol::OperationResult;
use tracing::{debug, error};

use crate::api::{ApiResponse, RemoteError};
use crate::rate_limit::RateLimiter;
use crate::retry::{RetryExecutor, RetryPolicy};

/// Runs remote operations with rate limiting, retries, and uniform error
/// reporting.
#[derive(Debug, Clone)]
pub struct RemoteOperations {
    executor: RetryExecutor,
    policy: RetryPolicy,
}

impl RemoteOperations {
    /// Creates a facade over a shared limiter.
    #[must_use]
    pub fn new(limiter: Arc<RateLimiter>, policy: RetryPolicy) -> Self {
        Self {
            executor: RetryExecutor::new(limiter),
            policy,
        }
    }

    /// Creates a facade, and the limiter behind it, from configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(RateLimiter::new(config.rate_limit.clone())),
            RetryPolicy::from_config(&config.retry),
        )
    }

    /// Returns the shared rate limiter.
    #[must_use]
    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        self.executor.rate_limiter()
    }

    /// Returns the retry executor.
    #[must_use]
    pub fn retry_executor(&self) -> &RetryExecutor {
        &self.executor
    }

    /// Returns the default retry policy.
    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Runs `call` under the default policy.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use ghtools_config::RateLimitConfig;
    /// use ghtools_github::api::{ApiResponse, RemoteError};
    /// use ghtools_github::{RateLimiter, RemoteOperations, RetryPolicy};
    /// use ghtools_protocol::ErrorCategory;
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let limiter = Arc::new(RateLimiter::new(RateLimitConfig::default()));
    /// let operations = RemoteOperations::new(limiter, RetryPolicy::default());
    ///
    /// let ok = operations
    ///     .execute("answer", || async { Ok(ApiResponse::ok(42)) })
    ///     .await;
    /// assert_eq!(ok.data(), Some(&42));
    ///
    /// let missing = operations
    ///     .execute::<(), _, _>("missing", || async { Err(RemoteError::new(404, "Not Found")) })
    ///     .await;
    /// assert_eq!(missing.error().unwrap().category(), ErrorCategory::GitHubApi);
    /// # }
    /// ```
    pub async fn execute<T, F, Fut>(&self, operation: &str, call: F) -> OperationResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<ApiResponse<T>, RemoteError>>,
    {
        self.execute_with(operation, &self.policy, call).await
    }

    /// Runs `call` under an explicit policy.
    pub async fn execute_with<T, F, Fut>(
        &self,
        operation: &str,
        policy: &RetryPolicy,
        call: F,
    ) -> OperationResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<ApiResponse<T>, RemoteError>>,
    {
        debug!(operation, "executing remote operation");

        match self.executor.execute(operation, policy, call).await {
            Ok(response) => OperationResult::success(response.data),
            Err(err) => {
                let standardized = err.to_standardized(operation);
                error!(
                    operation,
                    category = ?standardized.category(),
                    code = standardized.code(),
                    error = %err,
                    "remote operation failed"
                );
                OperationResult::failure(standardized)
            }
        }
    }
}
