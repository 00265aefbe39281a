//! Repository tools.
//!
//! - [`GitHubTools::get_repository`]: fetch a repository
//! - [`GitHubTools::create_repository`]: create a repository for the
//!   authenticated user or an organization

use ghtools_protocol::OperationResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::api::{ApiRequest, Method};
use crate::tools::{GitHubTools, rejected, repo_path, require, require_repo, segment};

/// Options for a new repository.
///
/// # Example
///
/// ```
/// use ghtools_github::NewRepository;
///
/// let repo = NewRepository {
///     name: "scratch".to_string(),
///     description: Some("Experiments".to_string()),
///     private: true,
///     ..Default::default()
/// };
/// assert!(!repo.auto_init);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRepository {
    /// The repository name.
    pub name: String,
    /// A short description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the repository is private.
    #[serde(default)]
    pub private: bool,
    /// Whether to create an initial commit with an empty README.
    #[serde(default)]
    pub auto_init: bool,
}

impl GitHubTools {
    /// Fetches a repository.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # async fn example(tools: ghtools_github::GitHubTools) {
    /// let result = tools.get_repository("rust-lang", "rust").await;
    /// if let Some(repo) = result.data() {
    ///     println!("{} stars", repo["stargazers_count"]);
    /// }
    /// # }
    /// ```
    #[instrument(skip(self), fields(owner = %owner, repo = %repo))]
    pub async fn get_repository(&self, owner: &str, repo: &str) -> OperationResult<Value> {
        const OPERATION: &str = "get_repository";
        if let Err(err) = require_repo(owner, repo) {
            return rejected(OPERATION, &err);
        }

        debug!("fetching repository");
        self.run(OPERATION, ApiRequest::get(repo_path(owner, repo)))
            .await
    }

    /// Creates a repository.
    ///
    /// The repository is created under `org` when given, otherwise under the
    /// authenticated user. Requires an authenticated client.
    #[instrument(skip(self, repository), fields(name = %repository.name, org = ?org))]
    pub async fn create_repository(
        &self,
        repository: &NewRepository,
        org: Option<&str>,
    ) -> OperationResult<Value> {
        const OPERATION: &str = "create_repository";
        if let Err(err) = require("name", &repository.name) {
            return rejected(OPERATION, &err);
        }
        if let Some(Err(err)) = org.map(|org| require("org", org)) {
            return rejected(OPERATION, &err);
        }

        debug!("creating repository");
        self.run_with_body(OPERATION, Method::Post, create_path(org), repository)
            .await
    }
}

fn create_path(org: Option<&str>) -> String {
    match org {
        Some(org) => format!("/orgs/{}/repos", segment(org)),
        None => "/user/repos".to_string(),
    }
}
