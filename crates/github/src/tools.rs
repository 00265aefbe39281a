//! GitHub operations exposed as agent tools.
//!
//! [`GitHubTools`] pairs the transport ([`GitHubClient`]) with the shared
//! [`RemoteOperations`] facade. Each tool lives in the module for its entity
//! and returns an [`OperationResult`] holding GitHub's raw JSON:
//!
//! | Module | Tools |
//! |--------|-------|
//! | `repository` | `get_repository`, `create_repository` |
//! | `branch` | `list_branches`, `create_branch` |
//! | `issue` | `list_issues`, `create_issue` |
//! | `pull_request` | `get_pull_request`, `merge_pull_request` |
//! | `content` | `get_file_contents` |
//! | `release` | `create_release` |
//! | this module | `rate_limit_status` |
//!
//! Inputs are checked before anything is sent; bad input is reported as a
//! validation failure and never reaches the rate limiter.

use std::sync::Arc;

use ghtools_config::Config;
use ghtools_protocol::OperationResult;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, PercentEncode, utf8_percent_encode};
use serde::Serialize;
use serde_json::Value;
use tracing::{instrument, warn};

use crate::api::{ApiRequest, Method};
use crate::client::GitHubClient;
use crate::error::{Error, Result};
use crate::facade::RemoteOperations;

/// Characters escaped in a single path segment.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// The tool surface: one method per GitHub operation.
///
/// # Examples
///
/// ```no_run
/// use ghtools_config::Config;
/// use ghtools_github::{GitHubClient, GitHubTools};
///
/// # async fn example() -> ghtools_github::Result<()> {
/// let config = Config::default();
/// let client = GitHubClient::new(None).await?;
/// let tools = GitHubTools::from_config(client, &config);
///
/// let result = tools.get_repository("rust-lang", "rust").await;
/// println!("{}", serde_json::to_string_pretty(&result).unwrap());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct GitHubTools {
    client: Arc<GitHubClient>,
    operations: RemoteOperations,
}

impl GitHubTools {
    /// Creates the tool surface over a client and a facade.
    #[must_use]
    pub fn new(client: GitHubClient, operations: RemoteOperations) -> Self {
        Self {
            client: Arc::new(client),
            operations,
        }
    }

    /// Creates the tool surface, and the rate limiter behind it, from
    /// configuration. The client's request timeout is taken from the retry
    /// settings.
    #[must_use]
    pub fn from_config(client: GitHubClient, config: &Config) -> Self {
        let client = client.with_request_timeout(config.retry.request_timeout());
        Self::new(client, RemoteOperations::from_config(config))
    }

    /// Returns the transport.
    #[must_use]
    pub fn client(&self) -> &GitHubClient {
        &self.client
    }

    /// Returns the shared facade.
    #[must_use]
    pub fn operations(&self) -> &RemoteOperations {
        &self.operations
    }

    /// Returns GitHub's view of the caller's quota (`GET /rate_limit`).
    #[instrument(skip(self))]
    pub async fn rate_limit_status(&self) -> OperationResult<Value> {
        self.run("rate_limit_status", ApiRequest::get("/rate_limit"))
            .await
    }

    /// Sends `request` through the facade.
    pub(crate) async fn run(&self, operation: &str, request: ApiRequest) -> OperationResult<Value> {
        let client = &self.client;
        let request = &request;
        self.operations
            .execute(operation, move || client.send(request))
            .await
    }

    /// Serializes `body` and sends it through the facade.
    pub(crate) async fn run_with_body<B: Serialize>(
        &self,
        operation: &str,
        method: Method,
        path: String,
        body: &B,
    ) -> OperationResult<Value> {
        let body = match serde_json::to_value(body) {
            Ok(body) => body,
            Err(err) => return rejected(operation, &Error::from(err)),
        };
        let request = ApiRequest {
            method,
            path,
            body: Some(body),
        };
        self.run(operation, request).await
    }
}

/// Reports an error raised before the remote call as a failed result.
pub(crate) fn rejected(operation: &str, err: &Error) -> OperationResult<Value> {
    warn!(operation, error = %err, "rejected operation");
    OperationResult::failure(err.to_standardized(operation))
}

/// Fails unless `value` has non-whitespace content.
pub(crate) fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidInput(format!("{field} must not be empty")));
    }
    Ok(())
}

/// Fails unless both repository coordinates are present.
pub(crate) fn require_repo(owner: &str, repo: &str) -> Result<()> {
    require("owner", owner)?;
    require("repo", repo)
}

/// Percent-encodes a single path segment.
pub(crate) fn segment(value: &str) -> PercentEncode<'_> {
    utf8_percent_encode(value, SEGMENT)
}

/// Percent-encodes a slash-separated path, keeping the slashes.
pub(crate) fn nested_path(value: &str) -> String {
    value
        .split('/')
        .filter(|part| !part.is_empty())
        .map(|part| segment(part).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Returns the `/repos/{owner}/{repo}` prefix with both parts encoded.
pub(crate) fn repo_path(owner: &str, repo: &str) -> String {
    format!("/repos/{}/{}", segment(owner), segment(repo))
}

/// Builds an unauthenticated tool surface for tests that never reach the
/// network.
#[cfg(test)]
pub(crate) async fn offline_tools() -> GitHubTools {
    let client = GitHubClient::new(None)
        .await
        .expect("octocrab client should build offline");
    GitHubTools::from_config(client, &Config::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghtools_protocol::ErrorCategory;

    #[test]
    fn segment_escapes_reserved_characters() {
        assert_eq!(segment("my-repo_v1.0~x").to_string(), "my-repo_v1.0~x");
        assert_eq!(segment("a/b").to_string(), "a%2Fb");
        assert_eq!(segment("with space").to_string(), "with%20space");
        assert_eq!(segment("q?x#y").to_string(), "q%3Fx%23y");
    }

    #[test]
    fn nested_path_keeps_separators() {
        assert_eq!(nested_path("feature/login"), "feature/login");
        assert_eq!(nested_path("/docs//READ ME.md"), "docs/READ%20ME.md");
    }

    #[test]
    fn repo_path_encodes_both_parts() {
        assert_eq!(repo_path("rust-lang", "rust"), "/repos/rust-lang/rust");
        assert_eq!(repo_path("o", "../etc"), "/repos/o/..%2Fetc");
    }

    #[test]
    fn require_rejects_blank_values() {
        assert!(require("owner", "octocat").is_ok());
        assert!(matches!(require("owner", ""), Err(Error::InvalidInput(_))));
        assert!(matches!(require("owner", "  \t"), Err(Error::InvalidInput(_))));
        assert!(require_repo("octocat", "").is_err());
    }

    #[test]
    fn rejected_is_a_validation_failure() {
        let result = rejected("get_repository", &Error::InvalidInput("owner must not be empty".into()));
        let error = result.error().unwrap();
        assert_eq!(error.category(), ErrorCategory::Validation);
        assert_eq!(error.context()["operation"], "get_repository");
    }

    #[tokio::test]
    async fn from_config_applies_request_timeout() {
        let mut config = Config::default();
        config.retry.request_timeout_ms = 1_500;
        let client = GitHubClient::new(None).await.unwrap();

        let tools = GitHubTools::from_config(client, &config);
        assert_eq!(
            tools.client().request_timeout(),
            std::time::Duration::from_millis(1_500)
        );
        assert_eq!(tools.operations().policy().max_retries, config.retry.max_retries);
    }
}
