//! GitHub API client for ghtools.
//!
//! This crate exposes GitHub operations as agent tools and carries the
//! infrastructure every one of them depends on: rate limiting, retries, and
//! uniform error reporting.
//!
//! # Overview
//!
//! Bottom-up, the crate provides:
//!
//! - [`timeout`]: [`SafeTimeout`], the cancellable delay behind every wait
//! - [`rate_limit`]: [`RateLimiter`], tracking GitHub's quota window and
//!   throttling callers before it runs out
//! - [`retry`]: [`RetryExecutor`], retrying transient failures with
//!   exponential backoff
//! - [`facade`]: [`RemoteOperations`], folding every outcome into an
//!   [`OperationResult`](ghtools_protocol::OperationResult)
//! - [`client`]: [`GitHubClient`], the octocrab-backed transport
//! - [`GitHubTools`]: the tools themselves, one module per entity
//!
//! # Authentication
//!
//! The client supports both authenticated and unauthenticated access:
//!
//! - **Authenticated**: 5,000 requests/hour, access to private repos
//! - **Unauthenticated**: 60 requests/hour, public repos only
//!
//! Tokens are handled using [`secrecy::SecretString`] to prevent accidental
//! logging of credentials.
//!
//! # Sharing the limiter
//!
//! One [`RateLimiter`] should exist per process. Every [`RemoteOperations`]
//! built from it (and every clone) shares the same quota state, so
//! concurrent tools throttle together:
//!
//! ```no_run
//! use std::sync::Arc;
//! use ghtools_config::Config;
//! use ghtools_github::{GitHubClient, GitHubTools, RateLimiter, RemoteOperations, RetryPolicy};
//!
//! # async fn example() -> ghtools_github::Result<()> {
//! let config = Config::default();
//! let limiter = Arc::new(RateLimiter::new(config.rate_limit.clone()));
//! let operations = RemoteOperations::new(limiter.clone(), RetryPolicy::from_config(&config.retry));
//!
//! let tools = GitHubTools::new(GitHubClient::new(None).await?, operations);
//! let result = tools.list_branches("rust-lang", "rust", 10).await;
//! println!("{}", serde_json::to_string(&result).unwrap());
//!
//! // Abort any pending waits, e.g. on Ctrl-C.
//! limiter.shutdown();
//! # Ok(())
//! # }
//! ```

pub mod api;
mod branch;
pub mod client;
mod content;
pub mod error;
pub mod facade;
mod issue;
mod pull_request;
pub mod rate_limit;
mod release;
mod repository;
pub mod retry;
pub mod timeout;
mod tools;

pub use client::GitHubClient;
pub use error::{Error, Result};
pub use facade::RemoteOperations;
pub use issue::{IssueState, ListIssuesOptions, NewIssue};
pub use pull_request::{MergeMethod, MergeOptions};
pub use rate_limit::{RateLimitState, RateLimiter};
pub use release::NewRelease;
pub use repository::NewRepository;
pub use retry::{RetryExecutor, RetryPolicy};
pub use timeout::{SafeTimeout, TimeoutHandle, TimeoutOutcome};
pub use tools::GitHubTools;
