//! Shared protocol types for ghtools.
//!
//! This crate defines the contracts every tool call shares: the
//! [`OperationResult`] envelope and the [`StandardizedError`] taxonomy.
//!
//! # Overview
//!
//! - [`result`]: The success/failure envelope
//! - [`error`]: Error categories, severities, the error record, and the
//!   message classifier
//!
//! # Examples
//!
//! ```
//! use ghtools_protocol::{ErrorCategory, OperationResult, StandardizedError};
//!
//! fn lookup(found: bool) -> OperationResult<&'static str> {
//!     if found {
//!         OperationResult::success("main")
//!     } else {
//!         OperationResult::failure(
//!             StandardizedError::new(ErrorCategory::GitHubApi, "Branch not found")
//!                 .with_context("operation", "get_branch"),
//!         )
//!     }
//! }
//!
//! assert!(lookup(true).is_successful());
//! assert_eq!(
//!     lookup(false).error().map(StandardizedError::category),
//!     Some(ErrorCategory::GitHubApi)
//! );
//! ```

pub mod error;
pub mod result;

// Re-export primary types at crate root for convenience
pub use error::{ErrorCategory, Severity, StandardizedError, classify_message};
pub use result::OperationResult;
