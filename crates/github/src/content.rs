//! File content tools.

use ghtools_protocol::OperationResult;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::api::ApiRequest;
use crate::tools::{GitHubTools, nested_path, rejected, repo_path, require, require_repo};

impl GitHubTools {
    /// Fetches a file or directory listing.
    ///
    /// `reference` selects a branch, tag, or commit; the default branch is
    /// used when it is `None`. File bodies come back base64-encoded in the
    /// `content` field, exactly as GitHub sends them.
    #[instrument(skip(self), fields(owner = %owner, repo = %repo, path = %path))]
    pub async fn get_file_contents(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        reference: Option<&str>,
    ) -> OperationResult<Value> {
        const OPERATION: &str = "get_file_contents";
        if let Err(err) = require_repo(owner, repo).and_then(|()| require("path", path)) {
            return rejected(OPERATION, &err);
        }

        debug!(reference = ?reference, "fetching contents");
        self.run(OPERATION, ApiRequest::get(contents_path(owner, repo, path, reference)))
            .await
    }
}

fn contents_path(owner: &str, repo: &str, path: &str, reference: Option<&str>) -> String {
    let mut url = format!("{}/contents/{}", repo_path(owner, repo), nested_path(path));
    if let Some(reference) = reference.filter(|r| !r.trim().is_empty()) {
        url.push_str("?ref=");
        url.push_str(&utf8_percent_encode(reference, NON_ALPHANUMERIC).to_string());
    }
    url
}
