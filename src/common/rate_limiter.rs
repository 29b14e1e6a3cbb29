//! Outbound rate limiting
//!
//! A sliding-window throttle: at most `max_calls` permits are granted within
//! any trailing `period`. Callers over the limit wait; they are never rejected.
//! Waiters are served in arrival order because the window lock is a fair
//! (FIFO) async mutex and is held while waiting.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

// ============================================================================
// OPTIONS
// ============================================================================

/// Sliding window bounds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LimiterOptions {
    /// Permits per window; values below 1 are treated as 1
    pub max_calls: u32,
    /// Window length
    pub period: Duration,
}

impl Default for LimiterOptions {
    fn default() -> Self {
        Self {
            max_calls: 5,
            period: Duration::from_secs(1),
        }
    }
}

// ============================================================================
// RATE LIMITER
// ============================================================================

/// Proof that a call may proceed.
#[derive(Debug, Clone, Copy)]
pub struct Permit {
    waited: Duration,
}

impl Permit {
    /// Time the caller spent waiting for this permit.
    pub fn waited(&self) -> Duration {
        self.waited
    }
}

/// Sliding-window rate limiter shared by all calls of one client.
#[derive(Debug)]
pub struct RateLimiter {
    options: LimiterOptions,
    /// Grant times inside the current window, oldest first
    grants: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(options: LimiterOptions) -> Self {
        let capacity = options.max_calls.max(1) as usize;
        Self {
            options,
            grants: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn options(&self) -> &LimiterOptions {
        &self.options
    }

    /// True when no grant is inside the window and nobody holds the lock.
    fn is_idle(&self) -> bool {
        match self.grants.try_lock() {
            Ok(grants) => grants
                .back()
                .map_or(true, |&last| last.elapsed() >= self.options.period),
            Err(_) => false,
        }
    }

    /// Waits until a call fits in the window and records it.
    ///
    /// Dropping the returned future before it completes records nothing.
    pub async fn acquire(&self) -> Permit {
        let requested = Instant::now();
        let max_calls = self.options.max_calls.max(1) as usize;
        let mut grants = self.grants.lock().await;

        loop {
            let now = Instant::now();
            while let Some(&oldest) = grants.front() {
                if now.duration_since(oldest) >= self.options.period {
                    grants.pop_front();
                } else {
                    break;
                }
            }

            if grants.len() < max_calls {
                grants.push_back(now);
                return Permit {
                    waited: now.duration_since(requested),
                };
            }

            if let Some(&oldest) = grants.front() {
                tokio::time::sleep_until(oldest + self.options.period).await;
            }
        }
    }
}

// ============================================================================
// LIMITER REGISTRY
// ============================================================================

/// One limiter per distinct `LimiterOptions`, shared by every call of a
/// client that uses those options.
///
/// Entries are evicted when a new options value is registered and the old
/// limiter is both unreferenced and idle, so callers that vary per-call
/// options do not grow the map without bound. An evicted limiter had no
/// grant inside its window, so recreating it later changes nothing.
#[derive(Debug, Default)]
pub struct LimiterRegistry {
    limiters: Mutex<HashMap<LimiterOptions, Arc<RateLimiter>>>,
}

impl LimiterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the limiter for `options`, creating it on first use.
    pub async fn limiter_for(&self, options: &LimiterOptions) -> Arc<RateLimiter> {
        let mut limiters = self.limiters.lock().await;
        if let Some(limiter) = limiters.get(options) {
            return Arc::clone(limiter);
        }

        limiters.retain(|_, limiter| Arc::strong_count(limiter) > 1 || !limiter.is_idle());

        let limiter = Arc::new(RateLimiter::new(options.clone()));
        limiters.insert(options.clone(), Arc::clone(&limiter));
        limiter
    }

    /// Number of registered limiters.
    pub async fn count(&self) -> usize {
        self.limiters.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_calls_within_capacity_do_not_wait() {
        let limiter = RateLimiter::new(LimiterOptions {
            max_calls: 3,
            period: Duration::from_secs(1),
        });
        for _ in 0..3 {
            assert!(limiter.acquire().await.waited().is_zero());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_max_calls_behaves_as_one() {
        let limiter = RateLimiter::new(LimiterOptions {
            max_calls: 0,
            period: Duration::from_millis(100),
        });
        assert!(limiter.acquire().await.waited().is_zero());
        assert_eq!(limiter.acquire().await.waited(), Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_registry_shares_limiter_per_options() {
        let registry = LimiterRegistry::new();
        let a = registry.limiter_for(&LimiterOptions::default()).await;
        let b = registry.limiter_for(&LimiterOptions::default()).await;
        let c = registry
            .limiter_for(&LimiterOptions {
                max_calls: 1,
                period: Duration::from_secs(1),
            })
            .await;
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[tokio::test(start_paused = true)]
    async fn test_registry_evicts_idle_unreferenced_limiters() {
        let registry = LimiterRegistry::new();
        let options = |max_calls| LimiterOptions {
            max_calls,
            period: Duration::from_secs(1),
        };

        // Window expired and no caller holds it: evicted on the next registration
        registry.limiter_for(&options(1)).await.acquire().await;
        tokio::time::sleep(Duration::from_secs(2)).await;

        // Still referenced by a caller: kept even after its window expires
        let held = registry.limiter_for(&options(3)).await;
        tokio::time::sleep(Duration::from_secs(2)).await;

        // Grant still inside the window: kept
        registry.limiter_for(&options(2)).await.acquire().await;
        registry.limiter_for(&options(4)).await;

        assert_eq!(registry.count().await, 3);
        let again = registry.limiter_for(&options(3)).await;
        assert!(Arc::ptr_eq(&held, &again));
    }
}
