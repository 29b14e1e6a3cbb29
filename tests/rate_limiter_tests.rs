//! Unit tests for the outbound rate limiter (rate_limiter module)

use cow_api::common::rate_limiter::RateLimiter;
use cow_api::LimiterOptions;
use futures::future::join_all;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

fn two_per_second() -> LimiterOptions {
    LimiterOptions {
        max_calls: 2,
        period: Duration::from_secs(1),
    }
}

// ============================================================================
// WINDOW TESTS
// ============================================================================

/// What is tested: The (max_calls + 1)-th call within one period waits for the window to advance
/// Why: This is the quota guarantee towards the upstream API
#[tokio::test(start_paused = true)]
async fn test_call_over_limit_is_delayed_until_window_advances() {
    let limiter = RateLimiter::new(LimiterOptions {
        max_calls: 5,
        period: Duration::from_secs(1),
    });
    let started = Instant::now();

    for _ in 0..5 {
        assert!(limiter.acquire().await.waited().is_zero());
    }
    let permit = limiter.acquire().await;

    assert_eq!(permit.waited(), Duration::from_secs(1));
    assert_eq!(started.elapsed(), Duration::from_secs(1));
}

/// What is tested: Calls spaced further apart than the period never wait
/// Why: The window slides; old grants stop counting once they are a full period old
#[tokio::test(start_paused = true)]
async fn test_window_slides() {
    let limiter = RateLimiter::new(LimiterOptions {
        max_calls: 1,
        period: Duration::from_millis(100),
    });

    for _ in 0..3 {
        assert!(limiter.acquire().await.waited().is_zero());
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

// ============================================================================
// FAIRNESS TESTS
// ============================================================================

/// What is tested: Concurrent callers over the limit are all served, in arrival order
/// Why: The limiter throttles but never rejects, and must not starve early callers
#[tokio::test(start_paused = true)]
async fn test_concurrent_callers_served_fifo_without_rejection() {
    let limiter = Arc::new(RateLimiter::new(two_per_second()));
    let grant_order = Arc::new(Mutex::new(Vec::new()));

    let callers = (0..5).map(|i| {
        let limiter = Arc::clone(&limiter);
        let grant_order = Arc::clone(&grant_order);
        async move {
            let permit = limiter.acquire().await;
            grant_order.lock().unwrap().push(i);
            permit.waited()
        }
    });
    let waits = join_all(callers).await;

    assert_eq!(*grant_order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    assert_eq!(
        waits,
        vec![
            Duration::ZERO,
            Duration::ZERO,
            Duration::from_secs(1),
            Duration::from_secs(1),
            Duration::from_secs(2),
        ]
    );
}

/// What is tested: Cancelling a waiting caller does not consume a permit
/// Why: Dropped requests must not eat into the quota of the remaining callers
#[tokio::test(start_paused = true)]
async fn test_cancelled_waiter_records_nothing() {
    let limiter = RateLimiter::new(LimiterOptions {
        max_calls: 1,
        period: Duration::from_secs(1),
    });
    limiter.acquire().await;

    let cancelled = tokio::time::timeout(Duration::from_millis(500), limiter.acquire()).await;
    assert!(cancelled.is_err());

    // Only the first grant counts, so the next caller waits for the rest of its window
    let permit = limiter.acquire().await;
    assert_eq!(permit.waited(), Duration::from_millis(500));
}
