//! Cancellable delays.
//!
//! Every wait in this crate (rate limit resets, quota rejections, retry
//! backoff) goes through [`SafeTimeout`], so a pending wait can always be
//! abandoned without leaving a timer behind. A timeout either elapses or is
//! cancelled first, never both, and the underlying timer is dropped as soon
//! as [`SafeTimeout::wait`] returns.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// How a [`SafeTimeout`] finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutOutcome {
    /// The full duration elapsed.
    Elapsed,
    /// The timeout was cancelled before it fired.
    Cancelled,
}

/// A delay that can be cancelled before it fires.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use ghtools_github::timeout::{SafeTimeout, TimeoutOutcome};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let timeout = SafeTimeout::new(Duration::from_secs(30), "example");
/// let handle = timeout.handle();
///
/// handle.cancel();
/// handle.cancel(); // idempotent
///
/// assert_eq!(timeout.wait().await, TimeoutOutcome::Cancelled);
/// # }
/// ```
#[derive(Debug)]
pub struct SafeTimeout {
    duration: Duration,
    label: String,
    token: CancellationToken,
}

impl SafeTimeout {
    /// Creates a timeout that only its own handles can cancel.
    #[must_use]
    pub fn new(duration: Duration, label: impl Into<String>) -> Self {
        Self {
            duration,
            label: label.into(),
            token: CancellationToken::new(),
        }
    }

    /// Creates a timeout that is also cancelled when `parent` is.
    ///
    /// Cancelling the timeout itself never cancels the parent.
    #[must_use]
    pub fn with_parent(
        duration: Duration,
        label: impl Into<String>,
        parent: &CancellationToken,
    ) -> Self {
        Self {
            duration,
            label: label.into(),
            token: parent.child_token(),
        }
    }

    /// Returns a handle that can cancel this timeout from elsewhere.
    #[must_use]
    pub fn handle(&self) -> TimeoutHandle {
        TimeoutHandle {
            token: self.token.clone(),
        }
    }

    /// Returns the configured duration.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Returns the label used in log output.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Waits for the timeout to elapse or be cancelled.
    ///
    /// If cancellation and expiry race, cancellation wins.
    pub async fn wait(self) -> TimeoutOutcome {
        if self.token.is_cancelled() {
            debug!(label = %self.label, "timeout cancelled before it started");
            return TimeoutOutcome::Cancelled;
        }

        trace!(label = %self.label, duration = ?self.duration, "timeout started");
        let outcome = tokio::select! {
            biased;
            () = self.token.cancelled() => TimeoutOutcome::Cancelled,
            () = tokio::time::sleep(self.duration) => TimeoutOutcome::Elapsed,
        };

        match outcome {
            TimeoutOutcome::Elapsed => trace!(label = %self.label, "timeout elapsed"),
            TimeoutOutcome::Cancelled => debug!(label = %self.label, "timeout cancelled"),
        }
        outcome
    }
}

/// A cloneable handle that cancels a [`SafeTimeout`].
#[derive(Debug, Clone)]
pub struct TimeoutHandle {
    token: CancellationToken,
}

impl TimeoutHandle {
    /// Cancels the timeout.
    ///
    /// Only the first call has an effect; calling this after the timeout
    /// elapsed does nothing.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called, or the
    /// parent token was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}
