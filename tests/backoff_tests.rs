//! Unit tests for the retry wrapper (backoff module)
//!
//! Time is paused so sleeps complete instantly while elapsed times stay exact.

use cow_api::common::backoff::with_backoff;
use cow_api::{ApiError, BackoffOptions, ErrorKind};
use std::time::Duration;
use tokio::time::Instant;

#[path = "helpers.rs"]
mod test_helpers;
use test_helpers::fast_backoff;

fn service_unavailable() -> ApiError {
    ApiError::from_status(503, "Service Unavailable".to_string())
}

fn bad_request() -> ApiError {
    ApiError::from_status(
        400,
        r#"{"errorType":"InvalidSignature","description":"bad signature"}"#.to_string(),
    )
}

// ============================================================================
// ATTEMPT LIMIT TESTS
// ============================================================================

/// What is tested: A permanently failing transient operation is attempted exactly max_tries times
/// Why: The retry wrapper must honour the attempt bound and surface the last error
#[tokio::test(start_paused = true)]
async fn test_transient_failure_attempted_max_tries_times() {
    let opts = BackoffOptions {
        max_tries: Some(4),
        initial_delay: Duration::from_millis(100),
        ..BackoffOptions::default()
    };
    let mut attempts = 0u32;

    let result: Result<(), ApiError> = with_backoff(&opts, || {
        attempts += 1;
        async { Err(service_unavailable()) }
    })
    .await;

    let err = result.unwrap_err();
    assert_eq!(attempts, 4);
    assert_eq!(err.status(), Some(503));
    assert_eq!(err.kind(), ErrorKind::Transient);
}

/// What is tested: Delays between attempts double from initial_delay
/// Why: Exponential growth is what keeps retries from hammering a struggling server
#[tokio::test(start_paused = true)]
async fn test_delays_grow_exponentially() {
    let opts = BackoffOptions {
        max_tries: Some(4),
        initial_delay: Duration::from_millis(100),
        ..BackoffOptions::default()
    };
    let started = Instant::now();

    let _: Result<(), ApiError> =
        with_backoff(&opts, || async { Err(service_unavailable()) }).await;

    // 100ms + 200ms + 400ms between the four attempts
    assert_eq!(started.elapsed(), Duration::from_millis(700));
}

/// What is tested: max_tries of 1 makes a single attempt
/// Why: Callers disable retries this way
#[tokio::test(start_paused = true)]
async fn test_no_retry_makes_single_attempt() {
    let mut attempts = 0u32;

    let result: Result<(), ApiError> = with_backoff(&BackoffOptions::no_retry(), || {
        attempts += 1;
        async { Err(service_unavailable()) }
    })
    .await;

    assert!(result.is_err());
    assert_eq!(attempts, 1);
}

// ============================================================================
// TIME LIMIT TESTS
// ============================================================================

/// What is tested: Retries stop once elapsed time reaches max_time even though attempts remain
/// Why: max_time bounds the total latency a caller can observe
#[tokio::test(start_paused = true)]
async fn test_retries_stop_at_max_time() {
    let opts = BackoffOptions {
        max_tries: None,
        max_time: Some(Duration::from_millis(250)),
        initial_delay: Duration::from_millis(100),
        ..BackoffOptions::default()
    };
    let started = Instant::now();
    let mut attempts = 0u32;

    let result: Result<(), ApiError> = with_backoff(&opts, || {
        attempts += 1;
        async { Err(service_unavailable()) }
    })
    .await;

    assert!(result.is_err());
    // Attempts at 0ms, 100ms and 250ms (second delay clamped from 200ms to 150ms)
    assert_eq!(attempts, 3);
    assert_eq!(started.elapsed(), Duration::from_millis(250));
}

// ============================================================================
// CLASSIFICATION TESTS
// ============================================================================

/// What is tested: A client error (HTTP 400) is returned after one attempt
/// Why: Retrying a request the server rejected as invalid can never succeed
#[tokio::test(start_paused = true)]
async fn test_client_error_is_not_retried() {
    let mut attempts = 0u32;

    let result: Result<(), ApiError> = with_backoff(&fast_backoff(10), || {
        attempts += 1;
        async { Err(bad_request()) }
    })
    .await;

    let err = result.unwrap_err();
    assert_eq!(attempts, 1);
    assert_eq!(err.error_type(), Some("InvalidSignature"));
}

/// What is tested: HTTP 429 is retried like a server error
/// Why: Upstream throttling is temporary
#[tokio::test(start_paused = true)]
async fn test_too_many_requests_is_retried() {
    let mut attempts = 0u32;

    let result: Result<(), ApiError> = with_backoff(&fast_backoff(3), || {
        attempts += 1;
        async { Err(ApiError::from_status(429, String::new())) }
    })
    .await;

    assert!(result.is_err());
    assert_eq!(attempts, 3);
}

/// What is tested: A malformed response is returned after one attempt
/// Why: Decoding failures are deterministic and must not be retried
#[tokio::test(start_paused = true)]
async fn test_malformed_response_is_not_retried() {
    let mut attempts = 0u32;

    let result: Result<(), ApiError> = with_backoff(&fast_backoff(10), || {
        attempts += 1;
        async {
            Err(ApiError::MalformedResponse {
                reason: "not JSON".to_string(),
                body: "<html>".to_string(),
            })
        }
    })
    .await;

    assert_eq!(result.unwrap_err().kind(), ErrorKind::Malformed);
    assert_eq!(attempts, 1);
}

/// What is tested: An operation that fails transiently and then succeeds returns the success
/// Why: Transient failures must be invisible to the caller once a retry succeeds
#[tokio::test(start_paused = true)]
async fn test_success_after_transient_failures() {
    let mut attempts = 0u32;

    let result: Result<&str, ApiError> = with_backoff(&fast_backoff(5), || {
        attempts += 1;
        let current = attempts;
        async move {
            if current < 3 {
                Err(service_unavailable())
            } else {
                Ok("done")
            }
        }
    })
    .await;

    assert_eq!(result.unwrap(), "done");
    assert_eq!(attempts, 3);
}

// ============================================================================
// CANCELLATION TESTS
// ============================================================================

/// What is tested: Dropping the retry future mid-delay stops all further attempts
/// Why: A cancelled call must not leave a pending retry that fires later
#[tokio::test(start_paused = true)]
async fn test_dropping_future_cancels_pending_retry() {
    let opts = BackoffOptions {
        max_tries: Some(10),
        initial_delay: Duration::from_millis(100),
        ..BackoffOptions::default()
    };
    let mut attempts = 0u32;

    // Attempts at 0ms and 100ms; dropped during the 200ms delay that follows
    let outcome = tokio::time::timeout(
        Duration::from_millis(150),
        with_backoff(&opts, || {
            attempts += 1;
            async { Err::<(), ApiError>(service_unavailable()) }
        }),
    )
    .await;
    assert!(outcome.is_err());

    tokio::time::sleep(Duration::from_secs(100)).await;

    assert_eq!(attempts, 2);
}
