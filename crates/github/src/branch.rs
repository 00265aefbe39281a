//! Branch tools.
//!
//! - [`GitHubTools::list_branches`]: list a repository's branches
//! - [`GitHubTools::create_branch`]: create a branch from another branch or
//!   a commit

use ghtools_protocol::{ErrorCategory, OperationResult, StandardizedError};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::api::{ApiRequest, Method};
use crate::tools::{GitHubTools, nested_path, rejected, repo_path, require, require_repo};

/// Default page size for branch listings.
pub const DEFAULT_BRANCHES_PER_PAGE: u8 = 30;

/// Request body for creating a git reference.
#[derive(Debug, Serialize)]
struct CreateRefRequest<'a> {
    #[serde(rename = "ref")]
    reference: String,
    sha: &'a str,
}

impl GitHubTools {
    /// Lists the branches of a repository.
    ///
    /// `per_page` is clamped to 1..=100; 0 selects the default of 30.
    #[instrument(skip(self), fields(owner = %owner, repo = %repo))]
    pub async fn list_branches(&self, owner: &str, repo: &str, per_page: u8) -> OperationResult<Value> {
        const OPERATION: &str = "list_branches";
        if let Err(err) = require_repo(owner, repo) {
            return rejected(OPERATION, &err);
        }

        let per_page = effective_per_page(per_page);
        debug!(per_page, "listing branches");
        let path = format!("{}/branches?per_page={per_page}", repo_path(owner, repo));
        self.run(OPERATION, ApiRequest::get(path)).await
    }

    /// Creates `branch` pointing at `from`.
    ///
    /// `from` is either a full commit SHA, used as is, or the name of an
    /// existing branch whose head commit is looked up first.
    #[instrument(skip(self), fields(owner = %owner, repo = %repo, branch = %branch, from = %from))]
    pub async fn create_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        from: &str,
    ) -> OperationResult<Value> {
        const OPERATION: &str = "create_branch";
        if let Err(err) = require_repo(owner, repo)
            .and_then(|()| require("branch", branch))
            .and_then(|()| require("from", from))
        {
            return rejected(OPERATION, &err);
        }

        let sha = if is_commit_sha(from) {
            from.to_string()
        } else {
            match self.resolve_branch_head(OPERATION, owner, repo, from).await {
                Ok(sha) => sha,
                Err(error) => return OperationResult::failure(error),
            }
        };

        debug!(sha = %sha, "creating branch");
        let body = CreateRefRequest {
            reference: format!("refs/heads/{}", branch.trim_start_matches("refs/heads/")),
            sha: &sha,
        };
        let path = format!("{}/git/refs", repo_path(owner, repo));
        self.run_with_body(OPERATION, Method::Post, path, &body)
            .await
    }

    async fn resolve_branch_head(
        &self,
        operation: &str,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<String, StandardizedError> {
        debug!(branch, "resolving branch head");
        let path = format!("{}/git/ref/heads/{}", repo_path(owner, repo), nested_path(branch));
        let reference = self.run(operation, ApiRequest::get(path)).await.into_result()?;

        match reference["object"]["sha"].as_str() {
            Some(sha) => Ok(sha.to_string()),
            None => {
                warn!(branch, "reference response carried no commit sha");
                Err(StandardizedError::new(
                    ErrorCategory::GitHubApi,
                    format!("branch {branch} did not resolve to a commit"),
                )
                .with_context("operation", operation)
                .with_context("branch", branch))
            }
        }
    }
}

fn effective_per_page(per_page: u8) -> u8 {
    match per_page {
        0 => DEFAULT_BRANCHES_PER_PAGE,
        n => n.min(100),
    }
}

fn is_commit_sha(value: &str) -> bool {
    value.len() == 40 && value.bytes().all(|b| b.is_ascii_hexdigit())
}
