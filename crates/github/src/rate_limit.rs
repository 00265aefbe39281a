//! Adaptive rate limiting against GitHub's quota window.
//!
//! GitHub reports the caller's remaining quota on every response:
//!
//! | Header | Meaning |
//! |--------|---------|
//! | `x-ratelimit-remaining` | Calls left in the current window |
//! | `x-ratelimit-reset` | Window reset, in epoch seconds |
//! | `x-ratelimit-limit` | Calls allowed per window |
//!
//! [`RateLimiter`] keeps the latest of these in a [`RateLimitState`] behind
//! an async mutex. Before each request, [`RateLimiter::check_rate_limit`]
//! holds the mutex while it decides (and, if needed, waits), so concurrent
//! callers cannot all observe the same stale quota and proceed together.
//!
//! Two wait ceilings apply:
//!
//! - [`MAX_PREDICTIVE_WAIT`] (60s) for throttling before a request is sent
//! - [`MAX_REACTIVE_WAIT`] (120s) after GitHub has actually rejected a call
//!
//! Waits longer than the ceiling fail fast with [`Error::RateLimited`].

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use ghtools_config::RateLimitConfig;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::api::ResponseHeaders;
use crate::error::{Error, Result};
use crate::timeout::{SafeTimeout, TimeoutOutcome};

/// Header with the calls left in the current window.
pub const HEADER_REMAINING: &str = "x-ratelimit-remaining";

/// Header with the window reset time, in epoch seconds.
pub const HEADER_RESET: &str = "x-ratelimit-reset";

/// Header with the calls allowed per window.
pub const HEADER_LIMIT: &str = "x-ratelimit-limit";

/// Longest wait [`RateLimiter::check_rate_limit`] will absorb.
pub const MAX_PREDICTIVE_WAIT: Duration = Duration::from_secs(60);

/// Longest wait [`RateLimiter::handle_rate_limit_exceeded`] will absorb.
pub const MAX_REACTIVE_WAIT: Duration = Duration::from_secs(120);

/// Quota assumed before the first response is seen.
pub const INITIAL_QUOTA: u64 = 5_000;

/// A snapshot of GitHub's quota window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitState {
    /// Calls left in the current window.
    pub remaining: u64,
    /// When the window resets.
    pub reset_at: DateTime<Utc>,
    /// Calls allowed per window.
    pub limit: u64,
}

impl RateLimitState {
    /// Returns the conservative state used before any response is seen:
    /// a full authenticated quota, resetting in one hour.
    #[must_use]
    pub fn initial() -> Self {
        Self {
            remaining: INITIAL_QUOTA,
            reset_at: Utc::now() + TimeDelta::hours(1),
            limit: INITIAL_QUOTA,
        }
    }

    /// Parses the quota headers of a response.
    ///
    /// Returns `None` unless all three headers are present and valid; a
    /// partial set never produces a state.
    ///
    /// # Examples
    ///
    /// ```
    /// use ghtools_github::api::ResponseHeaders;
    /// use ghtools_github::rate_limit::RateLimitState;
    ///
    /// let headers: ResponseHeaders = [
    ///     ("x-ratelimit-remaining", "4999"),
    ///     ("x-ratelimit-reset", "1700000000"),
    ///     ("x-ratelimit-limit", "5000"),
    /// ]
    /// .into_iter()
    /// .collect();
    ///
    /// let state = RateLimitState::from_headers(&headers).unwrap();
    /// assert_eq!(state.remaining, 4999);
    /// assert_eq!(state.reset_at.timestamp(), 1_700_000_000);
    ///
    /// let partial: ResponseHeaders = [("x-ratelimit-remaining", "1")].into_iter().collect();
    /// assert!(RateLimitState::from_headers(&partial).is_none());
    /// ```
    #[must_use]
    pub fn from_headers(headers: &ResponseHeaders) -> Option<Self> {
        let parse = |name: &str| headers.get(name)?.trim().parse::<u64>().ok();

        let remaining = parse(HEADER_REMAINING)?;
        let reset_secs = i64::try_from(parse(HEADER_RESET)?).ok()?;
        let limit = parse(HEADER_LIMIT).filter(|limit| *limit > 0)?;
        let reset_at = DateTime::from_timestamp(reset_secs, 0)?;

        Some(Self {
            remaining,
            reset_at,
            limit,
        })
    }

    /// Returns how long to wait from `now` until the window resets, plus
    /// `buffer`, or `None` if that moment has already passed.
    #[must_use]
    pub fn wait_until_reset(&self, now: DateTime<Utc>, buffer: Duration) -> Option<Duration> {
        let buffer = TimeDelta::from_std(buffer).unwrap_or(TimeDelta::zero());
        (self.reset_at - now + buffer)
            .to_std()
            .ok()
            .filter(|wait| !wait.is_zero())
    }
}

impl Default for RateLimitState {
    fn default() -> Self {
        Self::initial()
    }
}

/// Throttles callers against GitHub's quota window.
///
/// One limiter is constructed per process and shared (via `Arc`) by every
/// component that issues requests.
///
/// # Examples
///
/// ```
/// use ghtools_config::RateLimitConfig;
/// use ghtools_github::RateLimiter;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> ghtools_github::Result<()> {
/// let limiter = RateLimiter::new(RateLimitConfig::default());
///
/// // A fresh limiter assumes a full quota and never blocks.
/// limiter.check_rate_limit().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    state: Mutex<RateLimitState>,
    shutdown: CancellationToken,
    #[cfg(test)]
    sections: tests::SectionCounter,
}

impl RateLimiter {
    /// Creates a limiter with the [initial](RateLimitState::initial) state.
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_state(config, RateLimitState::initial())
    }

    /// Creates a limiter seeded with a known state.
    #[must_use]
    pub fn with_state(config: RateLimitConfig, state: RateLimitState) -> Self {
        Self {
            config,
            state: Mutex::new(state),
            shutdown: CancellationToken::new(),
            #[cfg(test)]
            sections: tests::SectionCounter::default(),
        }
    }

    /// Returns the limiter's configuration.
    #[must_use]
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Returns a copy of the current quota state.
    pub async fn state(&self) -> RateLimitState {
        *self.state.lock().await
    }

    /// Returns the token that aborts every pending wait when cancelled.
    ///
    /// The retry executor parents its backoff waits to the same token.
    #[must_use]
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    /// Cancels all pending and future waits.
    ///
    /// Waiting callers fail with [`Error::Cancelled`].
    pub fn shutdown(&self) {
        debug!("rate limiter shutting down, cancelling pending waits");
        self.shutdown.cancel();
    }

    /// Admits a caller, waiting for the quota window to reset if it is
    /// nearly exhausted.
    ///
    /// Returns immediately when rate limiting is disabled, when more than
    /// `min_remaining` calls are left, or when the reset time has passed.
    /// Otherwise waits until the reset plus the configured buffer. The
    /// state is left untouched after waiting; the next response's headers
    /// are authoritative.
    ///
    /// The mutex is held for the whole check, including the wait, so
    /// concurrent callers are admitted one at a time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RateLimited`] without waiting if the wait would
    /// exceed [`MAX_PREDICTIVE_WAIT`], and [`Error::Cancelled`] if the
    /// limiter shuts down mid-wait.
    #[instrument(skip(self))]
    pub async fn check_rate_limit(&self) -> Result<()> {
        let state = self.state.lock().await;
        #[cfg(test)]
        let _section = self.sections.enter();

        if !self.config.enabled || state.remaining > self.config.min_remaining {
            return Ok(());
        }

        let Some(wait) = state.wait_until_reset(Utc::now(), self.config.reset_buffer()) else {
            debug!(remaining = state.remaining, "quota low but reset time has passed");
            return Ok(());
        };

        if wait > MAX_PREDICTIVE_WAIT {
            warn!(
                remaining = state.remaining,
                wait = ?wait,
                "quota nearly exhausted and reset too far away, failing fast"
            );
            return Err(Error::RateLimited {
                reset_after: Some(wait),
            });
        }

        warn!(
            remaining = state.remaining,
            limit = state.limit,
            wait = ?wait,
            "quota nearly exhausted, waiting for reset"
        );
        let outcome = self.wait(wait, "rate limit reset").await;
        drop(state);
        outcome
    }

    /// Replaces the quota state from a response's headers.
    ///
    /// The whole state is overwritten (last write wins). If any of the three
    /// quota headers is missing or malformed, nothing changes.
    ///
    /// Returns `true` if the state was replaced.
    pub async fn update_from_headers(&self, headers: &ResponseHeaders) -> bool {
        let Some(next) = RateLimitState::from_headers(headers) else {
            return false;
        };

        let mut state = self.state.lock().await;
        #[cfg(test)]
        let _section = self.sections.enter();
        *state = next;
        debug!(
            remaining = next.remaining,
            limit = next.limit,
            reset_at = %next.reset_at,
            "updated rate limit state"
        );
        true
    }

    /// Waits out an explicit quota rejection from GitHub.
    ///
    /// The wait is taken from `retry_after` (seconds) when it parses, else
    /// from the time until the window resets plus the buffer, else the
    /// buffer alone.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RateLimited`] without waiting if the wait would
    /// exceed [`MAX_REACTIVE_WAIT`], and [`Error::Cancelled`] if the limiter
    /// shuts down mid-wait.
    #[instrument(skip(self))]
    pub async fn handle_rate_limit_exceeded(&self, retry_after: Option<&str>) -> Result<()> {
        let state = self.state.lock().await;
        #[cfg(test)]
        let _section = self.sections.enter();
        let buffer = self.config.reset_buffer();

        let wait = retry_after
            .and_then(parse_retry_after)
            .or_else(|| state.wait_until_reset(Utc::now(), buffer))
            .unwrap_or(buffer);

        if wait > MAX_REACTIVE_WAIT {
            warn!(wait = ?wait, "quota exceeded and reset too far away, failing fast");
            return Err(Error::RateLimited {
                reset_after: Some(wait),
            });
        }

        warn!(wait = ?wait, "quota exceeded, waiting before retrying");
        let outcome = self.wait(wait, "rate limit exceeded").await;
        drop(state);
        outcome
    }

    async fn wait(&self, duration: Duration, label: &str) -> Result<()> {
        match SafeTimeout::with_parent(duration, label, &self.shutdown)
            .wait()
            .await
        {
            TimeoutOutcome::Elapsed => Ok(()),
            TimeoutOutcome::Cancelled => Err(Error::Cancelled {
                label: label.to_string(),
            }),
        }
    }
}

/// Parses a `retry-after` value given in whole seconds.
fn parse_retry_after(raw: &str) -> Option<Duration> {
    raw.trim().parse::<u64>().ok().map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    /// Tracks how many callers are inside the limiter's mutex at once.
    #[derive(Debug, Default)]
    pub(super) struct SectionCounter {
        active: AtomicUsize,
        peak: AtomicUsize,
        entered: AtomicUsize,
    }

    impl SectionCounter {
        pub(super) fn enter(&self) -> SectionGuard<'_> {
            let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(active, Ordering::SeqCst);
            self.entered.fetch_add(1, Ordering::SeqCst);
            SectionGuard(self)
        }
    }

    pub(super) struct SectionGuard<'a>(&'a SectionCounter);

    impl Drop for SectionGuard<'_> {
        fn drop(&mut self) {
            self.0.active.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn config(min_remaining: u64, reset_buffer_ms: u64) -> RateLimitConfig {
        RateLimitConfig {
            enabled: true,
            min_remaining,
            reset_buffer_ms,
        }
    }

    fn state(remaining: u64, reset_in: TimeDelta) -> RateLimitState {
        RateLimitState {
            remaining,
            reset_at: Utc::now() + reset_in,
            limit: 5000,
        }
    }

    fn quota_headers(remaining: &str, reset: &str, limit: &str) -> ResponseHeaders {
        [
            (HEADER_REMAINING, remaining),
            (HEADER_RESET, reset),
            (HEADER_LIMIT, limit),
        ]
        .into_iter()
        .collect()
    }

    fn assert_close(actual: Duration, expected_ms: u64) {
        let expected = Duration::from_millis(expected_ms);
        let tolerance = Duration::from_millis(100);
        assert!(
            actual + tolerance >= expected && actual <= expected + tolerance,
            "expected ~{expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn initial_state_is_conservative() {
        let state = RateLimitState::initial();
        assert_eq!(state.remaining, INITIAL_QUOTA);
        assert_eq!(state.limit, INITIAL_QUOTA);
        assert!(state.reset_at > Utc::now() + TimeDelta::minutes(59));
    }

    #[test]
    fn from_headers_rejects_malformed_values() {
        assert!(RateLimitState::from_headers(&quota_headers("x", "1700000000", "5000")).is_none());
        assert!(RateLimitState::from_headers(&quota_headers("1", "soon", "5000")).is_none());
        assert!(RateLimitState::from_headers(&quota_headers("1", "1700000000", "0")).is_none());
        assert!(RateLimitState::from_headers(&quota_headers("-1", "1700000000", "5000")).is_none());
    }

    #[test]
    fn wait_until_reset_is_none_when_passed() {
        let past = state(0, TimeDelta::seconds(-10));
        assert!(past.wait_until_reset(Utc::now(), Duration::from_secs(1)).is_none());
    }

    #[test]
    fn wait_until_reset_includes_buffer() {
        let now = Utc::now();
        let state = RateLimitState {
            remaining: 0,
            reset_at: now + TimeDelta::seconds(2),
            limit: 5000,
        };
        assert_eq!(
            state.wait_until_reset(now, Duration::from_millis(500)),
            Some(Duration::from_millis(2500))
        );
    }

    #[test]
    fn parse_retry_after_accepts_whole_seconds() {
        assert_eq!(parse_retry_after("5"), Some(Duration::from_secs(5)));
        assert_eq!(parse_retry_after(" 12 "), Some(Duration::from_secs(12)));
        assert!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT").is_none());
        assert!(parse_retry_after("").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn check_does_not_block_above_threshold() {
        let limiter = RateLimiter::with_state(config(50, 500), state(51, TimeDelta::seconds(30)));
        let start = Instant::now();

        limiter.check_rate_limit().await.unwrap();
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn check_is_a_no_op_when_disabled() {
        let limiter = RateLimiter::with_state(
            RateLimitConfig::disabled(),
            state(0, TimeDelta::seconds(30)),
        );
        let start = Instant::now();

        limiter.check_rate_limit().await.unwrap();
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn check_waits_until_reset_plus_buffer() {
        let limiter = RateLimiter::with_state(
            config(50, 500),
            state(10, TimeDelta::milliseconds(2000)),
        );
        let start = Instant::now();

        limiter.check_rate_limit().await.unwrap();
        assert_close(start.elapsed(), 2500);

        // Waiting does not refresh the state; only headers do.
        assert_eq!(limiter.state().await.remaining, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn check_waits_at_threshold() {
        let limiter = RateLimiter::with_state(
            config(50, 0),
            state(50, TimeDelta::milliseconds(1000)),
        );
        let start = Instant::now();

        limiter.check_rate_limit().await.unwrap();
        assert_close(start.elapsed(), 1000);
    }

    #[tokio::test(start_paused = true)]
    async fn check_returns_when_reset_has_passed() {
        let limiter =
            RateLimiter::with_state(config(50, 500), state(0, TimeDelta::seconds(-5)));
        let start = Instant::now();

        limiter.check_rate_limit().await.unwrap();
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn check_fails_fast_beyond_sixty_seconds() {
        let limiter =
            RateLimiter::with_state(config(50, 500), state(10, TimeDelta::seconds(120)));
        let start = Instant::now();

        let err = limiter.check_rate_limit().await.unwrap_err();
        assert!(matches!(err, Error::RateLimited { reset_after: Some(_) }));
        assert_eq!(start.elapsed(), Duration::ZERO);

        // The mutex was released on the error path.
        limiter
            .update_from_headers(&quota_headers("4000", "1700000000", "5000"))
            .await;
        assert_eq!(limiter.state().await.remaining, 4000);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_checks_are_serialized() {
        let limiter = Arc::new(RateLimiter::with_state(
            config(50, 0),
            state(0, TimeDelta::milliseconds(1000)),
        ));
        let start = Instant::now();

        let (a, b) = tokio::join!(limiter.check_rate_limit(), limiter.check_rate_limit());
        a.unwrap();
        b.unwrap();

        // The wall clock does not advance under paused time, so each caller
        // computes a full one-second wait. Serialized, they take two.
        assert!(start.elapsed() >= Duration::from_millis(1900));
    }

    #[tokio::test(start_paused = true)]
    async fn checks_and_updates_never_overlap() {
        let limiter = Arc::new(RateLimiter::with_state(
            config(50, 0),
            state(0, TimeDelta::milliseconds(300)),
        ));
        let low_quota = quota_headers(
            "10",
            &(Utc::now() + TimeDelta::milliseconds(300))
                .timestamp()
                .to_string(),
            "5000",
        );

        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..12 {
            let limiter = Arc::clone(&limiter);
            let headers = low_quota.clone();
            tasks.spawn(async move {
                if i % 3 == 0 {
                    limiter.update_from_headers(&headers).await;
                    Ok(())
                } else if i % 3 == 1 {
                    limiter.check_rate_limit().await
                } else {
                    limiter.handle_rate_limit_exceeded(Some("0")).await
                }
            });
        }
        while let Some(joined) = tasks.join_next().await {
            joined.unwrap().unwrap();
        }

        let sections = &limiter.sections;
        assert_eq!(sections.entered.load(Ordering::SeqCst), 12);
        assert_eq!(sections.peak.load(Ordering::SeqCst), 1);
        assert_eq!(sections.active.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_pending_check() {
        let limiter = Arc::new(RateLimiter::with_state(
            config(50, 0),
            state(0, TimeDelta::seconds(30)),
        ));
        let waiter = tokio::spawn({
            let limiter = Arc::clone(&limiter);
            async move { limiter.check_rate_limit().await }
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        limiter.shutdown();

        let err = waiter.await.unwrap().unwrap_err();
        assert!(matches!(err, Error::Cancelled { .. }));
    }

    #[tokio::test]
    async fn update_replaces_whole_state() {
        let limiter = RateLimiter::new(RateLimitConfig::default());
        let applied = limiter
            .update_from_headers(&quota_headers("42", "1700000000", "60"))
            .await;

        assert!(applied);
        let state = limiter.state().await;
        assert_eq!(state.remaining, 42);
        assert_eq!(state.limit, 60);
        assert_eq!(state.reset_at.timestamp(), 1_700_000_000);
    }

    #[tokio::test]
    async fn update_ignores_partial_headers() {
        let limiter = RateLimiter::new(RateLimitConfig::default());
        let before = limiter.state().await;

        let partial: ResponseHeaders = [(HEADER_REMAINING, "1"), (HEADER_LIMIT, "5000")]
            .into_iter()
            .collect();
        assert!(!limiter.update_from_headers(&partial).await);
        assert!(!limiter.update_from_headers(&ResponseHeaders::new()).await);
        assert_eq!(limiter.state().await, before);
    }

    #[tokio::test(start_paused = true)]
    async fn exceeded_waits_for_retry_after() {
        let limiter = RateLimiter::new(config(50, 500));
        let start = Instant::now();

        limiter.handle_rate_limit_exceeded(Some("5")).await.unwrap();
        assert_close(start.elapsed(), 5000);
    }

    #[tokio::test(start_paused = true)]
    async fn exceeded_falls_back_to_reset_time() {
        let limiter = RateLimiter::with_state(
            config(50, 500),
            state(0, TimeDelta::milliseconds(3000)),
        );
        let start = Instant::now();

        limiter.handle_rate_limit_exceeded(None).await.unwrap();
        assert_close(start.elapsed(), 3500);
    }

    #[tokio::test(start_paused = true)]
    async fn exceeded_falls_back_to_buffer_when_reset_passed() {
        let limiter =
            RateLimiter::with_state(config(50, 750), state(0, TimeDelta::seconds(-1)));
        let start = Instant::now();

        limiter
            .handle_rate_limit_exceeded(Some("not-a-number"))
            .await
            .unwrap();
        assert_close(start.elapsed(), 750);
    }

    #[tokio::test(start_paused = true)]
    async fn exceeded_fails_fast_beyond_two_minutes() {
        let limiter = RateLimiter::new(config(50, 500));
        let start = Instant::now();

        let err = limiter
            .handle_rate_limit_exceeded(Some("121"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RateLimited { .. }));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn exceeded_allows_waits_between_ceilings() {
        // 90s is too long to throttle for, but acceptable after a rejection.
        let limiter = RateLimiter::new(config(50, 500));
        let start = Instant::now();

        limiter.handle_rate_limit_exceeded(Some("90")).await.unwrap();
        assert_close(start.elapsed(), 90_000);
    }

    proptest::proptest! {
        #[test]
        fn last_complete_update_wins(
            updates in proptest::collection::vec((0u64..10_000, 1_600_000_000i64..1_900_000_000, 1u64..10_000), 1..20)
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .unwrap();

            runtime.block_on(async {
                let limiter = RateLimiter::new(RateLimitConfig::default());
                for (remaining, reset, limit) in &updates {
                    let headers = quota_headers(
                        &remaining.to_string(),
                        &reset.to_string(),
                        &limit.to_string(),
                    );
                    limiter.update_from_headers(&headers).await;
                }

                let (remaining, reset, limit) = *updates.last().unwrap();
                let state = limiter.state().await;
                proptest::prop_assert_eq!(state.remaining, remaining);
                proptest::prop_assert_eq!(state.reset_at.timestamp(), reset);
                proptest::prop_assert_eq!(state.limit, limit);
                Ok(())
            })?;
        }
    }
}
