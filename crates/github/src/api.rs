//! Raw request and response types exchanged with the GitHub API.
//!
//! These types sit below the domain operations: an [`ApiRequest`] describes
//! one HTTP call, and it comes back either as an [`ApiResponse`] or as a
//! [`RemoteError`] carrying the status code, message, and headers needed to
//! decide whether the call is worth retrying.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

/// Header carrying GitHub's suggested wait after a quota rejection.
pub const HEADER_RETRY_AFTER: &str = "retry-after";

/// HTTP method of an [`ApiRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
}

/// A single GitHub REST call.
///
/// `path` is relative to the API base URL (e.g. `/repos/rust-lang/rust`),
/// including any query string.
///
/// # Examples
///
/// ```
/// use ghtools_github::api::{ApiRequest, Method};
/// use serde_json::json;
///
/// let request = ApiRequest::post("/repos/o/r/issues", json!({"title": "Bug"}));
/// assert_eq!(request.method, Method::Post);
/// assert_eq!(request.body, Some(json!({"title": "Bug"})));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// The HTTP method.
    pub method: Method,
    /// Path and query, relative to the API root.
    pub path: String,
    /// Optional JSON body.
    pub body: Option<Value>,
}

impl ApiRequest {
    /// Creates a `GET` request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            body: None,
        }
    }

    /// Creates a `POST` request with a JSON body.
    #[must_use]
    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::with_body(Method::Post, path, body)
    }

    /// Creates a `PUT` request with a JSON body.
    #[must_use]
    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::with_body(Method::Put, path, body)
    }

    /// Creates a `PATCH` request with a JSON body.
    #[must_use]
    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        Self::with_body(Method::Patch, path, body)
    }

    /// Creates a `DELETE` request.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            method: Method::Delete,
            path: path.into(),
            body: None,
        }
    }

    fn with_body(method: Method, path: impl Into<String>, body: Value) -> Self {
        Self {
            method,
            path: path.into(),
            body: Some(body),
        }
    }
}

/// Response headers, keyed by lowercase name.
///
/// Header names are case-insensitive on the wire; lookups here are too.
///
/// # Examples
///
/// ```
/// use ghtools_github::api::ResponseHeaders;
///
/// let headers: ResponseHeaders = [("X-RateLimit-Remaining", "42")].into_iter().collect();
/// assert_eq!(headers.get("x-ratelimit-remaining"), Some("42"));
/// assert_eq!(headers.get("X-RATELIMIT-REMAINING"), Some("42"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHeaders(BTreeMap<String, String>);

impl ResponseHeaders {
    /// Creates an empty header set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a header, replacing any previous value.
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.0
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
    }

    /// Returns a header value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Returns `true` if no headers are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for ResponseHeaders {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

/// A successful response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    /// The HTTP status code.
    pub status: u16,
    /// The response headers.
    pub headers: ResponseHeaders,
    /// The decoded body.
    pub data: T,
}

impl<T> ApiResponse<T> {
    /// Creates a `200 OK` response with no headers.
    #[must_use]
    pub fn ok(data: T) -> Self {
        Self {
            status: 200,
            headers: ResponseHeaders::new(),
            data,
        }
    }

    /// Replaces the headers.
    #[must_use]
    pub fn with_headers(mut self, headers: ResponseHeaders) -> Self {
        self.headers = headers;
        self
    }
}

/// The raw failure of one remote call, before any retry decision.
///
/// Failures that never produced an HTTP response (connection errors,
/// timeouts) have no status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    status: Option<u16>,
    message: String,
    headers: ResponseHeaders,
}

impl RemoteError {
    /// Creates an error for an HTTP failure response.
    #[must_use]
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
            headers: ResponseHeaders::new(),
        }
    }

    /// Creates an error for a call that produced no HTTP response.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
            headers: ResponseHeaders::new(),
        }
    }

    /// Attaches the failure response's headers.
    #[must_use]
    pub fn with_headers(mut self, headers: ResponseHeaders) -> Self {
        self.headers = headers;
        self
    }

    /// Returns the HTTP status, if a response was received.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Returns the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the failure response's headers.
    #[must_use]
    pub fn headers(&self) -> &ResponseHeaders {
        &self.headers
    }

    /// Returns the raw `retry-after` header, if present.
    #[must_use]
    pub fn retry_after(&self) -> Option<&str> {
        self.headers.get(HEADER_RETRY_AFTER)
    }

    /// Returns `true` if GitHub rejected the call because the quota is
    /// exhausted.
    ///
    /// That is a `429`, or a `403` whose message mentions the rate limit.
    ///
    /// # Examples
    ///
    /// ```
    /// use ghtools_github::api::RemoteError;
    ///
    /// assert!(RemoteError::new(403, "API rate limit exceeded for user").is_quota_exceeded());
    /// assert!(RemoteError::new(429, "Too Many Requests").is_quota_exceeded());
    /// assert!(!RemoteError::new(403, "Resource not accessible").is_quota_exceeded());
    /// ```
    #[must_use]
    pub fn is_quota_exceeded(&self) -> bool {
        match self.status {
            Some(429) => true,
            Some(403) => self.message.to_lowercase().contains("rate limit"),
            _ => false,
        }
    }

    /// Returns `true` if retrying the call may succeed.
    ///
    /// Server errors (`5xx`) and quota rejections are transient; everything
    /// else, including failures without a status, is terminal.
    ///
    /// # Examples
    ///
    /// ```
    /// use ghtools_github::api::RemoteError;
    ///
    /// assert!(RemoteError::new(502, "Bad Gateway").is_transient());
    /// assert!(!RemoteError::new(404, "Not Found").is_transient());
    /// assert!(!RemoteError::transport("connection refused").is_transient());
    /// ```
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self.status, Some(status) if status >= 500) || self.is_quota_exceeded()
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "HTTP {status}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for RemoteError {}
