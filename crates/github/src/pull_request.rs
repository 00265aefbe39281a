//! Pull request tools.

use ghtools_protocol::OperationResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::api::{ApiRequest, Method};
use crate::error::{Error, Result};
use crate::tools::{GitHubTools, rejected, repo_path, require_repo};

/// How a pull request is merged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMethod {
    /// A merge commit (default).
    #[default]
    Merge,
    /// All commits squashed into one.
    Squash,
    /// Commits replayed onto the base branch.
    Rebase,
}

/// Options for merging a pull request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeOptions {
    /// Title of the merge commit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_title: Option<String>,
    /// Message of the merge commit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_message: Option<String>,
    /// Head SHA the pull request must still be at for the merge to proceed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
    /// The merge method.
    #[serde(default)]
    pub merge_method: MergeMethod,
}

impl GitHubTools {
    /// Fetches a pull request.
    #[instrument(skip(self), fields(owner = %owner, repo = %repo))]
    pub async fn get_pull_request(&self, owner: &str, repo: &str, number: u64) -> OperationResult<Value> {
        const OPERATION: &str = "get_pull_request";
        if let Err(err) = validate(owner, repo, number) {
            return rejected(OPERATION, &err);
        }

        debug!("fetching pull request");
        let path = format!("{}/pulls/{number}", repo_path(owner, repo));
        self.run(OPERATION, ApiRequest::get(path)).await
    }

    /// Merges a pull request.
    ///
    /// GitHub answers `405` when the pull request is not mergeable and
    /// `409` when `options.sha` no longer matches the head; both come back
    /// as terminal failures.
    #[instrument(skip(self, options), fields(owner = %owner, repo = %repo, method = ?options.merge_method))]
    pub async fn merge_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        options: &MergeOptions,
    ) -> OperationResult<Value> {
        const OPERATION: &str = "merge_pull_request";
        if let Err(err) = validate(owner, repo, number) {
            return rejected(OPERATION, &err);
        }

        debug!("merging pull request");
        let path = format!("{}/pulls/{number}/merge", repo_path(owner, repo));
        self.run_with_body(OPERATION, Method::Put, path, options)
            .await
    }
}

fn validate(owner: &str, repo: &str, number: u64) -> Result<()> {
    require_repo(owner, repo)?;
    if number == 0 {
        return Err(Error::InvalidInput(
            "pull request number must be positive".to_string(),
        ));
    }
    Ok(())
}
