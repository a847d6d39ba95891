//! Request pacing for multi-page walks
//!
//! Two concerns live here:
//! - `PagingDelay` - randomized pause between pages to keep a browsing cadence
//! - `WalkBudget` - overall time limit plus a cancellation token, checked
//!   before each round-trip
//!
//! The per-request ceiling (token bucket) lives in [`crate::http::RateLimiter`].

use crate::error::{Error, Result};
use rand::Rng as _;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Minimum pause between pages
pub const DEFAULT_MIN_DELAY: Duration = Duration::from_secs(1);

/// Maximum pause between pages
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(3);

/// Time limit for one multi-page walk (30 minutes)
pub const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(1800);

/// Uniformly random delay range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingDelay {
    /// Lower bound (inclusive)
    pub min: Duration,
    /// Upper bound (inclusive)
    pub max: Duration,
}

impl Default for PagingDelay {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_DELAY,
            max: DEFAULT_MAX_DELAY,
        }
    }
}

impl PagingDelay {
    /// Create a delay range; bounds are swapped if given in reverse
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// A range that never sleeps
    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    /// Draw one delay from the range
    pub fn sample(&self) -> Duration {
        let min = self.min.as_micros() as u64;
        let max = self.max.as_micros() as u64;
        if min == max {
            return self.min;
        }
        Duration::from_micros(rand::rng().random_range(min..=max))
    }

    /// Sleep for a sampled delay, waking early on cancellation
    pub async fn pause(&self, cancel: &CancellationToken) -> Result<()> {
        let delay = self.sample();
        if delay.is_zero() {
            return Ok(());
        }

        debug!("Pausing {:?} before next page", delay);
        tokio::select! {
            () = tokio::time::sleep(delay) => Ok(()),
            () = cancel.cancelled() => Err(Error::Cancelled { pages: 0 }),
        }
    }
}

/// Bounds a walk in time and lets callers abort it
#[derive(Debug, Clone)]
pub struct WalkBudget {
    /// Overall time limit, if any
    pub time_limit: Option<Duration>,
    /// External cancellation signal
    pub cancel: CancellationToken,
}

impl Default for WalkBudget {
    fn default() -> Self {
        Self {
            time_limit: Some(DEFAULT_TIME_LIMIT),
            cancel: CancellationToken::new(),
        }
    }
}

impl WalkBudget {
    /// Create a budget with the given limit and token
    pub fn new(time_limit: Option<Duration>, cancel: CancellationToken) -> Self {
        Self { time_limit, cancel }
    }

    /// A budget with no time limit and a fresh token
    pub fn unlimited() -> Self {
        Self::new(None, CancellationToken::new())
    }

    /// Fail if the walk was cancelled or ran past its limit
    ///
    /// `pages` is the number of pages already consumed, for the error.
    pub fn check(&self, started: Instant, pages: usize) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled { pages });
        }
        if let Some(limit) = self.time_limit {
            if started.elapsed() >= limit {
                return Err(Error::DeadlineExceeded {
                    limit_secs: limit.as_secs(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_defaults() {
        let delay = PagingDelay::default();
        assert_eq!(delay.min, Duration::from_secs(1));
        assert_eq!(delay.max, Duration::from_secs(3));
    }

    #[test]
    fn test_delay_sample_in_range() {
        let delay = PagingDelay::new(Duration::from_millis(10), Duration::from_millis(20));
        for _ in 0..100 {
            let sampled = delay.sample();
            assert!(sampled >= delay.min && sampled <= delay.max);
        }
    }

    #[test]
    fn test_delay_swaps_reversed_bounds() {
        let delay = PagingDelay::new(Duration::from_secs(3), Duration::from_secs(1));
        assert_eq!(delay.min, Duration::from_secs(1));
        assert_eq!(delay.max, Duration::from_secs(3));
    }

    #[test]
    fn test_zero_delay_does_not_sleep() {
        let cancel = CancellationToken::new();
        tokio_test::block_on(async {
            assert!(PagingDelay::none().pause(&cancel).await.is_ok());
        });
    }

    #[tokio::test]
    async fn test_pause_wakes_on_cancel() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let delay = PagingDelay::new(Duration::from_secs(60), Duration::from_secs(60));
        let result = delay.pause(&cancel).await;
        assert!(matches!(result, Err(Error::Cancelled { .. })));
    }

    #[test]
    fn test_budget_check() {
        let budget = WalkBudget::unlimited();
        assert!(budget.check(Instant::now(), 0).is_ok());

        budget.cancel.cancel();
        assert!(matches!(
            budget.check(Instant::now(), 3),
            Err(Error::Cancelled { pages: 3 })
        ));
    }

    #[test]
    fn test_budget_deadline() {
        let budget = WalkBudget::new(Some(Duration::ZERO), CancellationToken::new());
        assert!(matches!(
            budget.check(Instant::now(), 0),
            Err(Error::DeadlineExceeded { limit_secs: 0 })
        ));
    }
}
