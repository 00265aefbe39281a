//! Error types for GitHub API operations.
//!
//! This module defines the errors that can escape the retry executor and
//! the rate limiter, and how each one maps onto the
//! [`StandardizedError`] taxonomy reported to agents.

use std::time::Duration;

use ghtools_protocol::{ErrorCategory, StandardizedError, classify_message};

use crate::api::RemoteError;

/// Errors that can occur during GitHub API operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The octocrab client could not be built or failed outside a request.
    #[error("GitHub API error: {0}")]
    Api(#[from] octocrab::Error),

    /// Token validation failed.
    ///
    /// This occurs when a provided token is invalid, expired, or lacks
    /// the necessary permissions.
    #[error("token validation failed: {reason}")]
    TokenValidation {
        /// A description of why validation failed.
        reason: String,
    },

    /// The rate limiter refused to wait this long.
    ///
    /// Raised without retrying: waiting is the only remedy and the wait
    /// exceeds what a single call is allowed to absorb.
    #[error("rate limit exceeded{}", format_reset_time(*.reset_after))]
    RateLimited {
        /// Time until the rate limit resets, if known.
        reset_after: Option<Duration>,
    },

    /// A remote call failed terminally or ran out of retries.
    #[error("{operation} failed after {attempts} attempt(s): {source}")]
    Remote {
        /// The operation that issued the call.
        operation: String,
        /// How many times the call was made.
        attempts: u32,
        /// The last failure.
        #[source]
        source: RemoteError,
    },

    /// A pending wait was cancelled, usually because the process is
    /// shutting down.
    #[error("wait for {label} was cancelled")]
    Cancelled {
        /// The label of the cancelled wait.
        label: String,
    },

    /// An operation received unusable input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A request body could not be serialized.
    #[error("failed to serialize request body: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Formats the reset time for the rate limit error message.
fn format_reset_time(reset_after: Option<Duration>) -> String {
    match reset_after {
        Some(duration) => format!(", resets in {} seconds", duration.as_secs()),
        None => String::new(),
    }
}

impl Error {
    /// Returns the taxonomy category for this error.
    ///
    /// Remote failures with a status are [`ErrorCategory::GitHubApi`] unless
    /// GitHub rejected the credential (`401`). Failures that never produced
    /// a response, and errors that carry no structure of their own, are
    /// classified from their message and may end up
    /// [`ErrorCategory::Unknown`].
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Remote { source, .. } if source.status() == Some(401) => {
                ErrorCategory::Authentication
            }
            Self::Remote { source, .. } if source.status().is_none() => {
                classify_message(source.message())
            }
            Self::Remote { .. } | Self::RateLimited { .. } => ErrorCategory::GitHubApi,
            Self::TokenValidation { .. } => ErrorCategory::Authentication,
            Self::InvalidInput(_) => ErrorCategory::Validation,
            Self::Cancelled { .. } | Self::Serialize(_) => ErrorCategory::System,
            Self::Api(e) => classify_message(&e.to_string()),
        }
    }

    /// Returns the error code reported alongside the category.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::RateLimited { .. } => "RATE_LIMIT_EXCEEDED",
            Self::Remote { source, .. } if source.is_quota_exceeded() => "RATE_LIMIT_EXCEEDED",
            Self::Remote { source, .. } if source.status().is_none() => "NETWORK_ERROR",
            Self::Cancelled { .. } => "OPERATION_CANCELLED",
            Self::TokenValidation { .. } => "INVALID_TOKEN",
            _ => self.category().default_code(),
        }
    }

    /// Converts this error into a [`StandardizedError`] for `operation`.
    ///
    /// The operation name and the original error are always kept in the
    /// context; remote failures also record the status and attempt count.
    ///
    /// # Examples
    ///
    /// ```
    /// use ghtools_github::Error;
    /// use ghtools_github::api::RemoteError;
    /// use ghtools_protocol::ErrorCategory;
    ///
    /// let err = Error::Remote {
    ///     operation: "get_repository".to_string(),
    ///     attempts: 1,
    ///     source: RemoteError::new(404, "Not Found"),
    /// };
    /// let standardized = err.to_standardized("get_repository");
    ///
    /// assert_eq!(standardized.category(), ErrorCategory::GitHubApi);
    /// assert_eq!(standardized.context()["status"], 404);
    /// ```
    #[must_use]
    pub fn to_standardized(&self, operation: &str) -> StandardizedError {
        let mut standardized = StandardizedError::new(self.category(), self.to_string())
            .with_code(self.code())
            .with_context("operation", operation)
            .with_context("original_error", format!("{self:?}"));

        match self {
            Self::Remote {
                attempts, source, ..
            } => {
                standardized = standardized
                    .with_context("attempts", *attempts)
                    .with_context("remote_message", source.message());
                if let Some(status) = source.status() {
                    standardized = standardized.with_context("status", status);
                }
            }
            Self::RateLimited {
                reset_after: Some(wait),
            } => {
                standardized = standardized.with_context("wait_seconds", wait.as_secs());
            }
            _ => {}
        }

        standardized
    }
}

/// A specialized Result type for GitHub API operations.
pub type Result<T> = std::result::Result<T, Error>;
