//! Minimum spacing between model calls, enforced with governor's GCRA.

use governor::clock::{Clock, DefaultClock};
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::fmt;
use std::time::Duration;
use tracing::debug;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Enforces a minimum interval between consecutive calls.
///
/// Backed by a burst-of-one quota: the first call proceeds immediately and
/// each later call is admitted one interval after the previous one. A zero
/// interval disables limiting.
pub struct MinIntervalLimiter {
    interval: Duration,
    limiter: Option<DirectRateLimiter>,
}

impl MinIntervalLimiter {
    pub fn new(interval: Duration) -> Self {
        let limiter = Quota::with_period(interval).map(RateLimiter::direct);
        Self { interval, limiter }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until a call is allowed, then mark it as made.
    pub async fn acquire(&self) {
        let Some(limiter) = &self.limiter else {
            return;
        };
        if let Err(not_until) = limiter.check() {
            let wait = not_until.wait_time_from(DefaultClock::default().now());
            debug!(wait_ms = wait.as_millis() as u64, "Rate limit wait");
            limiter.until_ready().await;
        }
    }
}

impl fmt::Debug for MinIntervalLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MinIntervalLimiter")
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}
