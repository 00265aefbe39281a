//! The success/failure envelope returned by every operation.
//!
//! [`OperationResult`] serializes to the shape agents expect:
//!
//! ```json
//! { "successful": true, "data": { ... } }
//! { "successful": false, "error": { "message": "...", "category": "GITHUB_API", ... } }
//! ```

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::error::StandardizedError;

/// The outcome of an operation: its data, or a [`StandardizedError`].
///
/// # Examples
///
/// ```
/// use ghtools_protocol::{OperationResult, StandardizedError};
///
/// let ok: OperationResult<u32> = OperationResult::success(7);
/// assert!(ok.is_successful());
/// assert_eq!(ok.data(), Some(&7));
///
/// let failed: OperationResult<u32> =
///     OperationResult::failure(StandardizedError::validation("missing title"));
/// assert!(!failed.is_successful());
/// assert_eq!(failed.error().map(|e| e.message()), Some("missing title"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum OperationResult<T> {
    /// The operation succeeded.
    Success {
        /// The operation's payload.
        data: T,
    },
    /// The operation failed.
    Failure {
        /// What went wrong.
        error: StandardizedError,
    },
}

impl<T> OperationResult<T> {
    /// Wraps a successful payload.
    #[must_use]
    pub fn success(data: T) -> Self {
        Self::Success { data }
    }

    /// Wraps a failure.
    #[must_use]
    pub fn failure(error: StandardizedError) -> Self {
        Self::Failure { error }
    }

    /// Returns `true` for [`OperationResult::Success`].
    #[must_use]
    pub fn is_successful(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Returns the payload, if successful.
    #[must_use]
    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Success { data } => Some(data),
            Self::Failure { .. } => None,
        }
    }

    /// Returns the error, if failed.
    #[must_use]
    pub fn error(&self) -> Option<&StandardizedError> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error } => Some(error),
        }
    }

    /// Transforms the payload, leaving failures untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> OperationResult<U> {
        match self {
            Self::Success { data } => OperationResult::Success { data: f(data) },
            Self::Failure { error } => OperationResult::Failure { error },
        }
    }

    /// Converts into a standard [`Result`].
    ///
    /// # Errors
    ///
    /// Returns the wrapped [`StandardizedError`] for a failure.
    pub fn into_result(self) -> Result<T, StandardizedError> {
        self.into()
    }
}

impl<T> From<Result<T, StandardizedError>> for OperationResult<T> {
    fn from(result: Result<T, StandardizedError>) -> Self {
        match result {
            Ok(data) => Self::Success { data },
            Err(error) => Self::Failure { error },
        }
    }
}

impl<T> From<OperationResult<T>> for Result<T, StandardizedError> {
    fn from(result: OperationResult<T>) -> Self {
        match result {
            OperationResult::Success { data } => Ok(data),
            OperationResult::Failure { error } => Err(error),
        }
    }
}

// Serde's internally tagged enums only accept string tags, so the boolean
// `successful` discriminant is written by hand.
impl<T: Serialize> Serialize for OperationResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("OperationResult", 2)?;
        match self {
            Self::Success { data } => {
                state.serialize_field("successful", &true)?;
                state.serialize_field("data", data)?;
            }
            Self::Failure { error } => {
                state.serialize_field("successful", &false)?;
                state.serialize_field("error", error)?;
            }
        }
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use serde_json::json;

    #[test]
    fn success_serializes_with_data() {
        let result = OperationResult::success(json!({"name": "ghtools"}));
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value, json!({"successful": true, "data": {"name": "ghtools"}}));
    }

    #[test]
    fn failure_serializes_with_error() {
        let result: OperationResult<()> = OperationResult::failure(
            StandardizedError::new(ErrorCategory::GitHubApi, "Not Found"),
        );
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["successful"], false);
        assert_eq!(value["error"]["message"], "Not Found");
        assert_eq!(value["error"]["category"], "GITHUB_API");
        assert!(value.get("data").is_none());
    }

    #[test]
    fn map_transforms_success_only() {
        let ok = OperationResult::success(2).map(|n| n * 10);
        assert_eq!(ok.data(), Some(&20));

        let failed: OperationResult<i32> =
            OperationResult::failure(StandardizedError::validation("bad"));
        let mapped = failed.map(|n| n * 10);
        assert!(!mapped.is_successful());
    }

    #[test]
    fn converts_to_and_from_result() {
        let ok: OperationResult<&str> = Ok("x").into();
        assert_eq!(ok.clone().into_result().unwrap(), "x");

        let err = StandardizedError::validation("bad");
        let failed: OperationResult<&str> = Err(err.clone()).into();
        assert_eq!(failed.into_result().unwrap_err(), err);
    }
}
