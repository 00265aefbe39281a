//! GitHub API client implementation.
//!
//! This module provides the [`GitHubClient`] struct, the transport that
//! every tool call goes through. It issues raw REST calls so that status
//! codes and headers (in particular the quota headers) are visible to the
//! rate limiter on both success and failure.

use std::time::Duration;

use octocrab::Octocrab;
use octocrab::service::middleware::retry::RetryConfig;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::api::{ApiRequest, ApiResponse, Method, RemoteError, ResponseHeaders};
use crate::error::{Error, Result};

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// GitHub API client with optional authentication.
///
/// Authenticated clients have higher rate limits (5,000 req/hour vs 60
/// req/hour) and can access private repositories.
///
/// # Security
///
/// Tokens are stored using [`SecretString`] to prevent accidental logging
/// or exposure in debug output.
///
/// # Examples
///
/// ```no_run
/// use secrecy::SecretString;
/// use ghtools_github::GitHubClient;
///
/// # async fn example() -> ghtools_github::Result<()> {
/// let token = SecretString::from("ghp_your_token".to_string());
/// let client = GitHubClient::new(Some(token)).await?;
///
/// let is_valid = client.validate_token().await?;
/// println!("Token valid: {}", is_valid);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct GitHubClient {
    /// The underlying octocrab client.
    inner: Octocrab,
    /// Whether this client is authenticated.
    authenticated: bool,
    /// Upper bound on a single call, excluding retries.
    request_timeout: Duration,
}

impl GitHubClient {
    /// Creates a new GitHub client.
    ///
    /// octocrab's own retry layer is turned off; retries are the job of
    /// [`RetryExecutor`](crate::RetryExecutor).
    ///
    /// # Errors
    ///
    /// Returns an error if the octocrab client fails to initialize.
    #[instrument(skip(token), fields(authenticated = token.is_some()))]
    pub async fn new(token: Option<SecretString>) -> Result<Self> {
        let builder = Octocrab::builder().add_retry_config(RetryConfig::None);
        let (inner, authenticated) = match token {
            Some(token) => {
                debug!("creating authenticated GitHub client");
                let client = builder
                    .personal_token(token.expose_secret())
                    .build()
                    .map_err(Error::Api)?;
                (client, true)
            }
            None => {
                debug!("creating unauthenticated GitHub client");
                (builder.build().map_err(Error::Api)?, false)
            }
        };

        Ok(Self {
            inner,
            authenticated,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Validates the current token by calling the `/user` endpoint.
    ///
    /// # Returns
    ///
    /// - `Ok(true)` if authenticated and the token is valid
    /// - `Ok(false)` if not authenticated (no token provided)
    ///
    /// # Errors
    ///
    /// Returns [`Error::TokenValidation`] if GitHub rejects the token, and
    /// [`Error::Remote`] for any other failure.
    #[instrument(skip(self))]
    pub async fn validate_token(&self) -> Result<bool> {
        if !self.authenticated {
            debug!("client is not authenticated, skipping validation");
            return Ok(false);
        }

        debug!("validating token by calling /user endpoint");
        match self.send(&ApiRequest::get("/user")).await {
            Ok(response) => {
                let login = response.data.get("login").and_then(Value::as_str);
                debug!(login = ?login, "token validated successfully");
                Ok(true)
            }
            Err(err) if err.status() == Some(401) => {
                warn!(message = %err.message(), "token validation failed");
                Err(Error::TokenValidation {
                    reason: err.message().to_string(),
                })
            }
            Err(err) => {
                warn!(error = %err, "API error during token validation");
                Err(Error::Remote {
                    operation: "validate_token".to_string(),
                    attempts: 1,
                    source: err,
                })
            }
        }
    }

    /// Returns whether this client was created with a token.
    ///
    /// This does not verify the token is still valid; use
    /// [`validate_token`](Self::validate_token) for that.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Returns a reference to the underlying octocrab client.
    #[must_use]
    pub fn inner(&self) -> &Octocrab {
        &self.inner
    }

    /// Sends one request, without retrying.
    ///
    /// Non-2xx responses come back as a [`RemoteError`] carrying the status,
    /// GitHub's `message`, and the response headers. Transport failures and
    /// timeouts come back as a [`RemoteError`] without a status.
    #[instrument(skip(self, request), fields(method = ?request.method, path = %request.path))]
    pub async fn send(
        &self,
        request: &ApiRequest,
    ) -> std::result::Result<ApiResponse<Value>, RemoteError> {
        let exchange = async {
            let body = request.body.as_ref();
            let path = request.path.as_str();
            let response = match request.method {
                Method::Get => self.inner._get(path).await,
                Method::Post => self.inner._post(path, body).await,
                Method::Put => self.inner._put(path, body).await,
                Method::Patch => self.inner._patch(path, body).await,
                Method::Delete => self.inner._delete(path, body).await,
            }?;

            let status = response.status();
            let headers: ResponseHeaders = response
                .headers()
                .iter()
                .filter_map(|(name, value)| Some((name.as_str(), value.to_str().ok()?)))
                .collect();
            let text = self.inner.body_to_string(response).await?;

            Ok::<_, octocrab::Error>((
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown Status"),
                headers,
                text,
            ))
        };

        let (status, reason, headers, text) =
            match tokio::time::timeout(self.request_timeout, exchange).await {
                Ok(Ok(parts)) => parts,
                Ok(Err(err)) => {
                    debug!(error = %err, "request failed without a response");
                    return Err(RemoteError::transport(err.to_string()));
                }
                Err(_) => {
                    debug!(timeout = ?self.request_timeout, "request timed out");
                    return Err(RemoteError::transport(format!(
                        "request timed out after {:?}",
                        self.request_timeout
                    )));
                }
            };

        decode_response(status, reason, headers, &text)
    }
}

/// Turns a raw status, headers, and body into a response or a failure.
fn decode_response(
    status: u16,
    reason: &str,
    headers: ResponseHeaders,
    text: &str,
) -> std::result::Result<ApiResponse<Value>, RemoteError> {
    let data = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
    };

    if (200..300).contains(&status) {
        debug!(status, "request succeeded");
        return Ok(ApiResponse {
            status,
            headers,
            data,
        });
    }

    let message = data
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or(reason)
        .to_string();
    debug!(status, message = %message, "request failed");
    Err(RemoteError::new(status, message).with_headers(headers))
}
