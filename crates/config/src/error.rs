//! Error types for configuration operations.
//!
//! This module defines the error types that can occur during configuration
//! loading and validation.

use std::path::PathBuf;

/// Errors that can occur during configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read a configuration file.
    #[error("failed to read config file at {path}: {source}")]
    ReadFile {
        /// The path that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse JSON5 configuration.
    #[error("failed to parse config: {0}")]
    ParseJson5(#[from] serde_json5::Error),

    /// Invalid rate limit settings.
    #[error("invalid rate limit settings: {reason}")]
    InvalidRateLimit {
        /// The reason the settings are invalid.
        reason: String,
    },

    /// Invalid retry settings.
    #[error("invalid retry settings: {reason}")]
    InvalidRetry {
        /// The reason the settings are invalid.
        reason: String,
    },

    /// An environment variable override could not be parsed.
    #[error("invalid value {value:?} for environment variable {name}")]
    InvalidEnvVar {
        /// The variable name.
        name: String,
        /// The raw value that failed to parse.
        value: String,
    },

    /// Failed to execute `gh auth token` command.
    #[error("failed to get GitHub token from gh CLI: {0}")]
    GhAuthFailed(#[source] std::io::Error),

    /// The `gh auth token` command returned an error.
    #[error("gh auth token failed with exit code {code:?}: {stderr}")]
    GhAuthError {
        /// The exit code, if available.
        code: Option<i32>,
        /// The stderr output.
        stderr: String,
    },
}

/// A specialized Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
