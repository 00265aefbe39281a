//! The standardized error taxonomy.
//!
//! Every failure that crosses an operation boundary is reported as a
//! [`StandardizedError`]: a structured record with a [`ErrorCategory`], a
//! [`Severity`], a machine-readable code, and an open key/value context.
//! Agents consume these as JSON, so the record never carries a raw stack
//! dump unless one is attached explicitly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The broad class of a failure.
///
/// Serialized in `SCREAMING_SNAKE_CASE` (e.g. `"GITHUB_API"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    /// Bad input, rejected before any remote call is made.
    Validation,
    /// The credential was rejected.
    Authentication,
    /// A remote call failed after exhausting retries, or the rate limiter
    /// refused to wait.
    #[serde(rename = "GITHUB_API")]
    GitHubApi,
    /// An unexpected internal fault.
    System,
    /// Anything that could not be classified.
    Unknown,
}

impl ErrorCategory {
    /// Returns the severity used when none is given explicitly.
    ///
    /// # Examples
    ///
    /// ```
    /// use ghtools_protocol::{ErrorCategory, Severity};
    ///
    /// assert_eq!(ErrorCategory::Validation.default_severity(), Severity::Warn);
    /// assert_eq!(ErrorCategory::System.default_severity(), Severity::Fatal);
    /// ```
    #[must_use]
    pub const fn default_severity(self) -> Severity {
        match self {
            Self::Validation => Severity::Warn,
            Self::Authentication | Self::GitHubApi | Self::Unknown => Severity::Error,
            Self::System => Severity::Fatal,
        }
    }

    /// Returns the error code used when none is given explicitly.
    #[must_use]
    pub const fn default_code(self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION_ERROR",
            Self::Authentication => "AUTHENTICATION_ERROR",
            Self::GitHubApi => "GITHUB_API_ERROR",
            Self::System => "SYSTEM_ERROR",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }
}

/// How serious a failure is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// Informational; the operation may still be usable.
    Info,
    /// Recoverable by the caller.
    Warn,
    /// The operation failed.
    Error,
    /// The process is in a state it cannot recover from.
    Fatal,
}

/// A structured, immutable error record.
///
/// Built with [`StandardizedError::new`] and the `with_*` builder methods;
/// once built there is no way to mutate it.
///
/// # Examples
///
/// ```
/// use ghtools_protocol::{ErrorCategory, Severity, StandardizedError};
///
/// let err = StandardizedError::new(ErrorCategory::GitHubApi, "merge failed")
///     .with_code("MERGE_CONFLICT")
///     .with_context("operation", "merge_pull_request")
///     .with_context("status", 409);
///
/// assert_eq!(err.category(), ErrorCategory::GitHubApi);
/// assert_eq!(err.severity(), Severity::Error);
/// assert_eq!(err.code(), "MERGE_CONFLICT");
/// assert_eq!(err.context()["status"], 409);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct StandardizedError {
    message: String,
    code: String,
    category: ErrorCategory,
    severity: Severity,
    timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    context: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stack: Option<String>,
}

impl StandardizedError {
    /// Creates an error with the category's default code and severity.
    #[must_use]
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: category.default_code().to_string(),
            category,
            severity: category.default_severity(),
            timestamp: Utc::now(),
            context: Map::new(),
            stack: None,
        }
    }

    /// Creates an error whose category is inferred from the message.
    ///
    /// See [`classify_message`] for the heuristics.
    ///
    /// # Examples
    ///
    /// ```
    /// use ghtools_protocol::{ErrorCategory, StandardizedError};
    ///
    /// let err = StandardizedError::classified("Bad credentials");
    /// assert_eq!(err.category(), ErrorCategory::Authentication);
    /// ```
    #[must_use]
    pub fn classified(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(classify_message(&message), message)
    }

    /// Shorthand for a [`ErrorCategory::Validation`] error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Validation, message)
    }

    /// Replaces the error code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    /// Replaces the severity.
    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Adds (or overwrites) one context entry.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Attaches a stack or source chain description.
    #[must_use]
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the machine-readable code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Returns the category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        self.category
    }

    /// Returns the severity.
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Returns when the error was created.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns the context map.
    #[must_use]
    pub fn context(&self) -> &Map<String, Value> {
        &self.context
    }

    /// Returns the attached stack, if any.
    #[must_use]
    pub fn stack(&self) -> Option<&str> {
        self.stack.as_deref()
    }
}

const AUTHENTICATION_HINTS: &[&str] = &[
    "bad credentials",
    "unauthorized",
    "authentication",
    "bad token",
    "invalid token",
    "token expired",
    "expired token",
    "token revoked",
];

const VALIDATION_HINTS: &[&str] = &["validation", "invalid", "required", "must not be empty"];

const GITHUB_API_HINTS: &[&str] = &[
    "network",
    "timed out",
    "timeout",
    "connection",
    "api error",
    "rate limit",
    "not found",
];

const SYSTEM_HINTS: &[&str] = &["internal", "serialize", "deserialize", "parse", "panicked"];

/// Infers an [`ErrorCategory`] from free-form error text.
///
/// Hints are whole words or phrases, so `"rapid"` does not count as
/// `"api"`. Matching is case-insensitive and checked in order:
/// authentication, validation, remote API/network, then internal faults.
/// Anything else is [`ErrorCategory::Unknown`].
///
/// # Examples
///
/// ```
/// use ghtools_protocol::{ErrorCategory, classify_message};
///
/// assert_eq!(classify_message("Validation Failed"), ErrorCategory::Validation);
/// assert_eq!(classify_message("connection reset by peer"), ErrorCategory::GitHubApi);
/// assert_eq!(classify_message("something odd"), ErrorCategory::Unknown);
/// ```
#[must_use]
pub fn classify_message(message: &str) -> ErrorCategory {
    let lower = message.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect();
    let contains_phrase = |phrase: &str| {
        let phrase: Vec<&str> = phrase.split(' ').collect();
        words.windows(phrase.len()).any(|window| window == phrase.as_slice())
    };
    let matches = |hints: &[&str]| hints.iter().any(|&hint| contains_phrase(hint));

    if matches(AUTHENTICATION_HINTS) {
        ErrorCategory::Authentication
    } else if matches(VALIDATION_HINTS) {
        ErrorCategory::Validation
    } else if matches(GITHUB_API_HINTS) {
        ErrorCategory::GitHubApi
    } else if matches(SYSTEM_HINTS) {
        ErrorCategory::System
    } else {
        ErrorCategory::Unknown
    }
}
