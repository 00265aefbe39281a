//! Issue tools.
//!
//! - [`ListIssuesOptions`]: filtering and pagination for issue listings
//! - [`IssueState`]: filter for issue state (open, closed, or all)
//! - [`GitHubTools::list_issues`]: list issues, excluding pull requests
//! - [`GitHubTools::create_issue`]: open a new issue
//!
//! # Example
//!
//! ```no_run
//! use ghtools_github::{GitHubTools, IssueState, ListIssuesOptions};
//!
//! # async fn example(tools: GitHubTools) {
//! let options = ListIssuesOptions {
//!     state: IssueState::Open,
//!     labels: vec!["bug".to_string()],
//!     per_page: 10,
//! };
//!
//! let result = tools.list_issues("rust-lang", "rust", &options).await;
//! if let Some(issues) = result.data().and_then(|data| data.as_array()) {
//!     println!("Found {} issues", issues.len());
//! }
//! # }
//! ```

use std::fmt;

use ghtools_protocol::OperationResult;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::api::{ApiRequest, Method};
use crate::tools::{GitHubTools, rejected, repo_path, require, require_repo};

/// Options for listing GitHub issues.
///
/// # Example
///
/// ```
/// use ghtools_github::{IssueState, ListIssuesOptions};
///
/// let options = ListIssuesOptions {
///     state: IssueState::All,
///     labels: vec!["enhancement".to_string(), "help wanted".to_string()],
///     per_page: 50,
/// };
/// assert_eq!(
///     options.query(),
///     "state=all&per_page=50&labels=enhancement%2Chelp%20wanted"
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListIssuesOptions {
    /// Filter by issue state (default: open).
    pub state: IssueState,
    /// Filter by labels (issues must have ALL these labels).
    pub labels: Vec<String>,
    /// Maximum issues per page (default: 30, max: 100).
    pub per_page: u8,
}

impl ListIssuesOptions {
    /// Returns the effective per_page value, clamped between 1 and 100.
    ///
    /// If `per_page` is 0, returns the default of 30.
    #[must_use]
    pub fn effective_per_page(&self) -> u8 {
        match self.per_page {
            0 => 30,
            n => n.min(100),
        }
    }

    /// Renders the options as a query string, without the leading `?`.
    #[must_use]
    pub fn query(&self) -> String {
        let mut query = format!("state={}&per_page={}", self.state, self.effective_per_page());
        if !self.labels.is_empty() {
            let labels = self.labels.join(",");
            query.push_str("&labels=");
            query.push_str(&utf8_percent_encode(&labels, NON_ALPHANUMERIC).to_string());
        }
        query
    }
}

/// Issue state filter for GitHub API queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    /// Only open issues (default).
    #[default]
    Open,
    /// Only closed issues.
    Closed,
    /// Both open and closed issues.
    All,
}

impl IssueState {
    /// Returns the value GitHub expects in the `state` parameter.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::All => "all",
        }
    }
}

impl fmt::Display for IssueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A new issue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewIssue {
    /// The issue title.
    pub title: String,
    /// The issue body, in Markdown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Labels to apply.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    /// Logins to assign.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assignees: Vec<String>,
}

impl GitHubTools {
    /// Lists the issues of a repository.
    ///
    /// GitHub returns pull requests from the issues endpoint too; those are
    /// filtered out.
    #[instrument(skip(self, options), fields(owner = %owner, repo = %repo))]
    pub async fn list_issues(
        &self,
        owner: &str,
        repo: &str,
        options: &ListIssuesOptions,
    ) -> OperationResult<Value> {
        const OPERATION: &str = "list_issues";
        if let Err(err) = require_repo(owner, repo) {
            return rejected(OPERATION, &err);
        }

        debug!(
            state = ?options.state,
            labels = ?options.labels,
            per_page = options.effective_per_page(),
            "listing issues"
        );
        let path = format!("{}/issues?{}", repo_path(owner, repo), options.query());
        self.run(OPERATION, ApiRequest::get(path))
            .await
            .map(without_pull_requests)
    }

    /// Opens a new issue.
    #[instrument(skip(self, issue), fields(owner = %owner, repo = %repo, title = %issue.title))]
    pub async fn create_issue(&self, owner: &str, repo: &str, issue: &NewIssue) -> OperationResult<Value> {
        const OPERATION: &str = "create_issue";
        if let Err(err) = require_repo(owner, repo).and_then(|()| require("title", &issue.title)) {
            return rejected(OPERATION, &err);
        }

        debug!("creating issue");
        let path = format!("{}/issues", repo_path(owner, repo));
        self.run_with_body(OPERATION, Method::Post, path, issue)
            .await
    }
}

/// Drops pull requests from an issue listing.
fn without_pull_requests(issues: Value) -> Value {
    match issues {
        Value::Array(items) => {
            let issues: Vec<_> = items
                .into_iter()
                .filter(|issue| issue.get("pull_request").is_none())
                .collect();
            debug!(count = issues.len(), "listed issues (excluding PRs)");
            Value::Array(issues)
        }
        other => other,
    }
}
