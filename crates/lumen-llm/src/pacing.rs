//! Minimum inter-request spacing for outbound LLM calls.

use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Enforces a minimum interval between requests: a token bucket of size
/// one. The next allowed slot is computed and reserved under the lock;
/// the wait itself happens outside it, so a slow sleeper never blocks
/// other threads from reserving their own slots.
#[derive(Debug)]
pub struct RequestPacer {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RequestPacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Mutex::new(None),
        }
    }

    /// Waits until this caller's reserved slot arrives.
    pub async fn wait(&self) {
        let wait = {
            let mut slot = self.next_slot.lock();
            let now = Instant::now();
            let at = match *slot {
                Some(t) if t > now => t,
                _ => now,
            };
            *slot = Some(at + self.interval);
            at.saturating_duration_since(now)
        };

        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_request_is_immediate() {
        let pacer = RequestPacer::new(Duration::from_millis(100));
        let start = Instant::now();
        pacer.wait().await;
        assert!(start.elapsed() < Duration::from_millis(1));
    }

    #[tokio::test(start_paused = true)]
    async fn back_to_back_requests_are_spaced() {
        let pacer = RequestPacer::new(Duration::from_millis(100));
        let start = Instant::now();

        pacer.wait().await;
        pacer.wait().await;
        pacer.wait().await;

        // Third request lands at least two intervals after the first.
        assert!(start.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn idle_period_resets_the_window() {
        let pacer = RequestPacer::new(Duration::from_millis(100));
        pacer.wait().await;

        tokio::time::sleep(Duration::from_millis(500)).await;

        let start = Instant::now();
        pacer.wait().await;
        assert!(start.elapsed() < Duration::from_millis(1));
    }
}
