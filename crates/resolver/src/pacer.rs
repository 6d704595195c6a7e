//! Outbound request pacing.

use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Spaces outbound resolution calls by a minimum interval.
///
/// The pacer holds a single piece of shared mutable state: the instant of
/// the last dispatched request. Callers suspend until the interval has
/// elapsed, then stamp the state. The lock is held only to read or write the
/// instant, never across the sleep, so concurrent callers can race the
/// read-then-write and dispatch closer together than the interval. Average
/// spacing is best-effort only; strict mutual exclusion is deliberately not
/// provided.
#[derive(Debug)]
pub struct RequestPacer {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RequestPacer {
    /// Create a pacer with the given minimum spacing.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    /// Suspend until the minimum interval since the last dispatch has
    /// elapsed, then record this dispatch.
    pub async fn pace(&self) {
        if self.min_interval.is_zero() {
            return;
        }

        let wait = {
            let last = self
                .last_request
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            last.map(|t| self.min_interval.saturating_sub(t.elapsed()))
        };

        if let Some(wait) = wait {
            if !wait.is_zero() {
                tokio::time::sleep(wait).await;
            }
        }

        let mut last = self
            .last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *last = Some(Instant::now());
    }
}
