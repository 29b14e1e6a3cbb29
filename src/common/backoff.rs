//! Retry with exponential backoff
//!
//! `with_backoff` wraps any async operation and repeats it while it fails
//! with a transient error. The n-th retry waits `initial_delay * 2^(n-1)`,
//! capped by `max_delay`, optionally jittered, and never past `max_time`.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, warn};

use crate::error::Retryable;

// ============================================================================
// OPTIONS
// ============================================================================

/// Randomization applied to each computed delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Jitter {
    /// Uniform in `[0, delay]`
    Full,
    /// `delay / 2` plus uniform in `[0, delay / 2]`
    Equal,
}

impl Jitter {
    fn apply(self, delay: Duration) -> Duration {
        let mut rng = rand::thread_rng();
        match self {
            Jitter::Full => delay.mul_f64(rng.gen_range(0.0..=1.0)),
            Jitter::Equal => {
                let half = delay / 2;
                half + half.mul_f64(rng.gen_range(0.0..=1.0))
            }
        }
    }
}

/// Retry policy.
///
/// `None` on `max_tries` or `max_time` leaves that axis unbounded; the first
/// configured bound that is reached stops the retries.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffOptions {
    /// Maximum attempts including the first one
    pub max_tries: Option<u32>,
    /// Ceiling on total elapsed time, measured from the first attempt
    pub max_time: Option<Duration>,
    pub jitter: Option<Jitter>,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Upper bound for a single delay
    pub max_delay: Option<Duration>,
}

impl Default for BackoffOptions {
    fn default() -> Self {
        Self {
            max_tries: Some(10),
            max_time: None,
            jitter: None,
            initial_delay: Duration::from_secs(1),
            max_delay: None,
        }
    }
}

impl BackoffOptions {
    /// Policy that makes a single attempt.
    pub fn no_retry() -> Self {
        Self {
            max_tries: Some(1),
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (1-based), before jitter.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry.saturating_sub(1)).unwrap_or(u32::MAX);
        let delay = self.initial_delay.saturating_mul(factor);
        match self.max_delay {
            Some(max_delay) => delay.min(max_delay),
            None => delay,
        }
    }
}

// ============================================================================
// RETRY WRAPPER
// ============================================================================

/// Runs `op` until it succeeds, fails with a non-transient error, or the
/// retry bounds in `opts` are exhausted.
///
/// # Arguments
///
/// * `opts` - Retry policy
/// * `op` - Factory producing one attempt per call
///
/// # Returns
///
/// * `Ok(T)` - Result of the first successful attempt
/// * `Err(E)` - The non-transient error, or the last transient error once bounds are exhausted
pub async fn with_backoff<T, E, F, Fut>(opts: &BackoffOptions, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + Display,
{
    let started = Instant::now();
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;

        let err = match op().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !err.is_transient() {
            return Err(err);
        }

        if let Some(max_tries) = opts.max_tries {
            if attempt >= max_tries {
                error!("Giving up after {} attempt(s): {}", attempt, err);
                return Err(err);
            }
        }

        let mut delay = opts.delay_for(attempt);
        if let Some(jitter) = opts.jitter {
            delay = jitter.apply(delay);
        }

        if let Some(max_time) = opts.max_time {
            let elapsed = started.elapsed();
            if elapsed >= max_time {
                error!(
                    "Giving up after {} attempt(s) and {:?}: {}",
                    attempt, elapsed, err
                );
                return Err(err);
            }
            delay = delay.min(max_time - elapsed);
        }

        warn!(
            "Attempt {} failed with transient error, retrying in {:?}: {}",
            attempt, delay, err
        );
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_doubles_per_retry() {
        let opts = BackoffOptions {
            initial_delay: Duration::from_millis(100),
            ..BackoffOptions::default()
        };
        assert_eq!(opts.delay_for(1), Duration::from_millis(100));
        assert_eq!(opts.delay_for(2), Duration::from_millis(200));
        assert_eq!(opts.delay_for(4), Duration::from_millis(800));
    }

    #[test]
    fn test_delay_is_capped() {
        let opts = BackoffOptions {
            initial_delay: Duration::from_millis(100),
            max_delay: Some(Duration::from_millis(250)),
            ..BackoffOptions::default()
        };
        assert_eq!(opts.delay_for(3), Duration::from_millis(250));
        // Shift overflow saturates instead of wrapping
        assert_eq!(opts.delay_for(64), Duration::from_millis(250));
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let delay = Duration::from_millis(400);
        for _ in 0..100 {
            assert!(Jitter::Full.apply(delay) <= delay);
            let equal = Jitter::Equal.apply(delay);
            assert!(equal >= delay / 2 && equal <= delay);
        }
    }
}
