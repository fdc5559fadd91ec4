//! Sliding-window rate limiter for provider calls
//!
//! Every provider request must first call [`RateLimiter::acquire`]. The
//! limiter keeps the timestamps of the grants made within the last period and
//! suspends callers (cooperatively, via `tokio::time::sleep`) while the window
//! is full. The window state is re-read under the lock immediately before a
//! grant is recorded, so concurrent callers can never push the window above
//! its cap. Grant order under contention is not FIFO.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Length of the rolling window the provider quota is expressed in
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(60);

/// Rolling-window call limiter shared by all fetch paths
#[derive(Debug)]
pub struct RateLimiter {
    calls_per_period: usize,
    period: Duration,
    grants: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Creates a limiter allowing `calls_per_minute` grants per rolling minute
    pub fn new(calls_per_minute: u32) -> Self {
        Self::with_period(calls_per_minute, DEFAULT_PERIOD)
    }

    /// Creates a limiter with a custom window length
    pub fn with_period(calls_per_period: u32, period: Duration) -> Self {
        Self {
            calls_per_period: calls_per_period.max(1) as usize,
            period,
            grants: Mutex::new(VecDeque::new()),
        }
    }

    /// Maximum number of grants in any window
    pub fn capacity(&self) -> usize {
        self.calls_per_period
    }

    /// Waits until one more call fits in the window, then records it
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut grants = self.grants.lock().await;
                let now = Instant::now();
                self.prune(&mut grants, now);

                if grants.len() < self.calls_per_period {
                    grants.push_back(now);
                    return;
                }

                match grants.front() {
                    Some(&oldest) => self.period.saturating_sub(now.duration_since(oldest)),
                    None => Duration::ZERO,
                }
            };

            tracing::debug!("Rate window full, waiting {:?}", wait);
            tokio::time::sleep(wait).await;
        }
    }

    /// Number of grants currently inside the window
    pub async fn in_window(&self) -> usize {
        let mut grants = self.grants.lock().await;
        self.prune(&mut grants, Instant::now());
        grants.len()
    }

    /// Drops grants older than one period
    fn prune(&self, grants: &mut VecDeque<Instant>, now: Instant) {
        while let Some(&oldest) = grants.front() {
            if now.duration_since(oldest) >= self.period {
                grants.pop_front();
            } else {
                break;
            }
        }
    }
}
