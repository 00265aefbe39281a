//! Release tools.

use ghtools_protocol::OperationResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::api::Method;
use crate::tools::{GitHubTools, rejected, repo_path, require, require_repo};

/// A new release.
///
/// # Example
///
/// ```
/// use ghtools_github::NewRelease;
///
/// let release = NewRelease {
///     tag_name: "v1.0.0".to_string(),
///     name: Some("1.0".to_string()),
///     draft: true,
///     ..Default::default()
/// };
/// assert!(!release.prerelease);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRelease {
    /// The tag to create or release from.
    pub tag_name: String,
    /// Branch or commit the tag is created from, if the tag does not exist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_commitish: Option<String>,
    /// The release title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Release notes, in Markdown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Create an unpublished draft.
    #[serde(default)]
    pub draft: bool,
    /// Mark as a pre-release.
    #[serde(default)]
    pub prerelease: bool,
}

impl GitHubTools {
    /// Creates a release.
    #[instrument(skip(self, release), fields(owner = %owner, repo = %repo, tag = %release.tag_name))]
    pub async fn create_release(&self, owner: &str, repo: &str, release: &NewRelease) -> OperationResult<Value> {
        const OPERATION: &str = "create_release";
        if let Err(err) = require_repo(owner, repo).and_then(|()| require("tag_name", &release.tag_name)) {
            return rejected(OPERATION, &err);
        }

        debug!(draft = release.draft, prerelease = release.prerelease, "creating release");
        let path = format!("{}/releases", repo_path(owner, repo));
        self.run_with_body(OPERATION, Method::Post, path, release)
            .await
    }
}
