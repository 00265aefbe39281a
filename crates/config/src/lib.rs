//! Configuration management for ghtools.
//!
//! This crate loads and validates configuration from a file, environment
//! variables, and built-in defaults.
//!
//! # Overview
//!
//! The crate is organized into the following modules:
//!
//! - [`config`]: Core configuration struct, loading, and environment overrides
//! - [`rate_limit`]: Rate limiter thresholds
//! - [`retry`]: Retry, backoff, and per-request timeout settings
//! - [`auth`]: GitHub token resolution
//! - [`persistence`]: Config file discovery and reading
//! - [`error`]: Error types for configuration operations
//!
//! # Configuration Sources (Priority)
//!
//! Configuration is loaded from multiple sources with the following priority
//! (highest to lowest):
//!
//! 1. Environment variables (`GHTOOLS_*`, `GITHUB_TOKEN`)
//! 2. The file named by `$GHTOOLS_CONFIG`
//! 3. Local config (`./ghtools.json5` or `./ghtools.json`)
//! 4. User config (`~/.config/ghtools/config.json5` or `~/.config/ghtools/config.json`)
//! 5. Built-in defaults
//!
//! # Example File
//!
//! ```json5
//! {
//!   rate_limit: { enabled: true, min_remaining: 100, reset_buffer_ms: 1000 },
//!   retry: { max_retries: 3, base_delay_ms: 1000, request_timeout_ms: 30000 },
//! }
//! ```
//!
//! # Examples
//!
//! ```no_run
//! use ghtools_config::Config;
//!
//! # async fn example() -> ghtools_config::Result<()> {
//! let config = Config::load().await?;
//! println!("Throttle below {} remaining", config.rate_limit.min_remaining);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod persistence;
pub mod rate_limit;
pub mod retry;

// Re-export primary types at crate root for convenience
pub use config::Config;
pub use error::{ConfigError, Result};
pub use rate_limit::RateLimitConfig;
pub use retry::RetryConfig;
