//! GitHub token resolution.
//!
//! This module provides token resolution with a fallback chain:
//!
//! 1. The configured token (file or `GITHUB_TOKEN` override)
//! 2. `gh auth token` command (GitHub CLI)
//! 3. Unauthenticated (returns `None`)

use crate::error::{ConfigError, Result};

/// Resolves the GitHub token to use as the bearer credential.
///
/// Tries the configured token first, then the `gh` CLI. Blank tokens are
/// ignored.
///
/// # Returns
///
/// Returns `Some(token)` if a token is available, `None` otherwise. Failures
/// of the `gh` CLI are treated as "no token".
///
/// # Examples
///
/// ```no_run
/// use ghtools_config::auth::resolve_token;
///
/// # async fn example() {
/// let token = resolve_token(Some("ghp_configured")).await;
/// assert_eq!(token.as_deref(), Some("ghp_configured"));
/// # }
/// ```
pub async fn resolve_token(configured: Option<&str>) -> Option<String> {
    if let Some(token) = configured.map(str::trim).filter(|t| !t.is_empty()) {
        return Some(token.to_string());
    }

    get_gh_token().await.ok().flatten()
}

/// Gets a GitHub token from the `gh` CLI.
///
/// Runs `gh auth token` and returns the token if successful.
///
/// # Returns
///
/// - `Ok(Some(token))` if the command succeeds and returns a token
/// - `Ok(None)` if the `gh` command is not found
/// - `Err(...)` if the command exists but fails
///
/// # Errors
///
/// Returns an error if:
/// - The `gh` command exists but returns an error
/// - The command output cannot be parsed
///
/// # Examples
///
/// ```no_run
/// use ghtools_config::auth::get_gh_token;
///
/// # async fn example() -> ghtools_config::Result<()> {
/// match get_gh_token().await? {
///     Some(token) => println!("Got token from gh CLI"),
///     None => println!("gh CLI not available"),
/// }
/// # Ok(())
/// # }
/// ```
pub async fn get_gh_token() -> Result<Option<String>> {
    use tokio::process::Command;

    match Command::new("gh").args(["auth", "token"]).output().await {
        Ok(output) => interpret_gh_output(
            output.status.success(),
            output.status.code(),
            &output.stdout,
            &output.stderr,
        ),
        // gh not installed, not an error
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ConfigError::GhAuthFailed(e)),
    }
}

/// Maps the outcome of `gh auth token` to a token.
///
/// A logged-out CLI and empty output both mean "no token".
fn interpret_gh_output(
    success: bool,
    code: Option<i32>,
    stdout: &[u8],
    stderr: &[u8],
) -> Result<Option<String>> {
    if !success {
        let stderr = String::from_utf8_lossy(stderr).trim().to_string();
        let logged_out = ["not logged in", "no oauth token"]
            .iter()
            .any(|hint| stderr.contains(hint));
        if logged_out {
            return Ok(None);
        }
        return Err(ConfigError::GhAuthError { code, stderr });
    }

    let token = String::from_utf8_lossy(stdout).trim().to_string();
    Ok(Some(token).filter(|t| !t.is_empty()))
}
