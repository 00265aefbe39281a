//! End-to-end behavior of the rate limiter, retry executor, and facade
//! working together against simulated GitHub responses.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use ghtools_config::RateLimitConfig;
use ghtools_github::api::{ApiResponse, RemoteError, ResponseHeaders};
use ghtools_github::{RateLimitState, RateLimiter, RemoteOperations, RetryPolicy};
use ghtools_protocol::ErrorCategory;
use serde_json::json;
use tokio::time::Instant;

fn quota(remaining: u64, reset_in_secs: i64) -> ResponseHeaders {
    let reset = (Utc::now() + TimeDelta::seconds(reset_in_secs)).timestamp();
    [
        ("X-RateLimit-Remaining", remaining.to_string()),
        ("X-RateLimit-Reset", reset.to_string()),
        ("X-RateLimit-Limit", "5000".to_string()),
    ]
    .into_iter()
    .collect()
}

fn operations(limiter: Arc<RateLimiter>) -> RemoteOperations {
    RemoteOperations::new(limiter, RetryPolicy::new(3, Duration::from_millis(100)))
}

#[tokio::test(start_paused = true)]
async fn low_quota_from_one_call_throttles_the_next() {
    let limiter = Arc::new(RateLimiter::new(RateLimitConfig {
        enabled: true,
        min_remaining: 50,
        reset_buffer_ms: 500,
    }));
    let operations = operations(limiter.clone());

    // The first response reports a nearly exhausted window.
    let first = operations
        .execute("list_issues", || async {
            Ok(ApiResponse::ok(json!([])).with_headers(quota(10, 2)))
        })
        .await;
    assert!(first.is_successful());
    assert_eq!(limiter.state().await.remaining, 10);

    // The second call waits out the window before it is sent.
    let start = Instant::now();
    let second = operations
        .execute("list_issues", || async { Ok(ApiResponse::ok(json!([]))) })
        .await;
    assert!(second.is_successful());

    // Reset is rounded down to whole epoch seconds, so the wait lands
    // between 1.5s and 2.5s.
    let waited = start.elapsed();
    assert!(
        waited >= Duration::from_millis(1400) && waited <= Duration::from_millis(2600),
        "waited {waited:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn distant_reset_fails_fast_as_github_api_error() {
    let limiter = Arc::new(RateLimiter::with_state(
        RateLimitConfig::default(),
        RateLimitState {
            remaining: 0,
            reset_at: Utc::now() + TimeDelta::minutes(10),
            limit: 5000,
        },
    ));
    let calls = AtomicUsize::new(0);
    let start = Instant::now();

    let result = operations(limiter)
        .execute::<(), _, _>("create_issue", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(ApiResponse::ok(())) }
        })
        .await;

    let error = result.error().unwrap();
    assert_eq!(error.category(), ErrorCategory::GitHubApi);
    assert_eq!(error.code(), "RATE_LIMIT_EXCEEDED");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn quota_rejection_is_retried_after_retry_after() {
    let limiter = Arc::new(RateLimiter::new(RateLimitConfig::default()));
    let calls = AtomicUsize::new(0);
    let start = Instant::now();

    let result = operations(limiter)
        .execute("get_repository", || {
            let call = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if call == 0 {
                    Err(RemoteError::new(403, "API rate limit exceeded for user ID 1.")
                        .with_headers([("Retry-After", "5")].into_iter().collect()))
                } else {
                    Ok(ApiResponse::ok(json!({"full_name": "octocat/hello"})))
                }
            }
        })
        .await;

    assert_eq!(result.data().unwrap()["full_name"], "octocat/hello");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    let waited = start.elapsed();
    assert!(
        waited >= Duration::from_millis(4900) && waited <= Duration::from_millis(5100),
        "waited {waited:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn exhausted_retries_report_attempts() {
    let limiter = Arc::new(RateLimiter::new(RateLimitConfig::default()));

    let result = operations(limiter)
        .execute::<(), _, _>("merge_pull_request", || async {
            Err(RemoteError::new(503, "Service Unavailable"))
        })
        .await;

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["successful"], false);
    assert_eq!(json["error"]["category"], "GITHUB_API");
    assert_eq!(json["error"]["context"]["attempts"], 4);
    assert_eq!(json["error"]["context"]["status"], 503);
    assert_eq!(json["error"]["context"]["operation"], "merge_pull_request");
}

#[tokio::test(start_paused = true)]
async fn clones_share_one_limiter() {
    let limiter = Arc::new(RateLimiter::new(RateLimitConfig::default()));
    let first = operations(limiter.clone());
    let second = first.clone();

    first
        .execute("rate_limit_status", || async {
            Ok(ApiResponse::ok(()).with_headers(quota(1234, 3600)))
        })
        .await;

    assert!(Arc::ptr_eq(first.rate_limiter(), second.rate_limiter()));
    assert_eq!(second.rate_limiter().state().await.remaining, 1234);
}

#[tokio::test(start_paused = true)]
async fn shutdown_interrupts_a_waiting_operation() {
    let limiter = Arc::new(RateLimiter::with_state(
        RateLimitConfig::default(),
        RateLimitState {
            remaining: 0,
            reset_at: Utc::now() + TimeDelta::seconds(30),
            limit: 5000,
        },
    ));
    let operations = operations(limiter.clone());

    let pending = tokio::spawn(async move {
        operations
            .execute::<(), _, _>("list_branches", || async { Ok(ApiResponse::ok(())) })
            .await
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    limiter.shutdown();

    let result = pending.await.unwrap();
    let error = result.error().unwrap();
    assert_eq!(error.category(), ErrorCategory::System);
    assert_eq!(error.code(), "OPERATION_CANCELLED");
}
