//! Politeness gate for outbound geocoding requests.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Fixed-interval gate shared by every caller that talks to one remote
/// service.
///
/// Admissions are spaced at least `interval` apart, and the first admission
/// of a run also waits one interval. Waiters queue on a fair mutex, so
/// concurrent callers are admitted one at a time in arrival order.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    last_admitted: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a gate with the given minimum spacing.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_admitted: Mutex::new(None),
        }
    }

    /// Wait until the next request may be sent.
    ///
    /// Returns `false` without waiting if the next slot falls at or after
    /// `deadline`. The slot is not consumed then.
    pub async fn acquire(&self, deadline: Option<Instant>) -> bool {
        let mut last = self.last_admitted.lock().await;
        let now = Instant::now();

        let earliest = match *last {
            Some(prev) => prev + self.interval,
            None => now + self.interval,
        };
        let at = earliest.max(now);

        if deadline.is_some_and(|d| at >= d) {
            return false;
        }

        tokio::time::sleep_until(at).await;
        *last = Some(at);
        true
    }
}
