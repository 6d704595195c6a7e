//! Bounded exponential-backoff retry.

use std::future::Future;
use std::time::Duration;
use vitrine_core::GatewayConfig;

/// Retry wrapper for a single resolution attempt.
///
/// On failure the policy waits `base × 2^attempt` and tries again, up to a
/// fixed attempt ceiling; the final failure is surfaced unchanged to the
/// caller.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    /// Create a policy with an attempt ceiling and base backoff delay.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Build from gateway configuration.
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(config.retry_max_attempts, config.retry_base_delay())
    }

    /// Run `op` until it succeeds or the attempt ceiling is reached.
    pub async fn run<T, E, F, Fut>(&self, op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.run_if(op, |_| true).await
    }

    /// Run `op`, retrying only failures for which `retryable` returns true.
    /// Non-retryable failures surface immediately.
    pub async fn run_if<T, E, F, Fut, P>(&self, mut op: F, retryable: P) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
    {
        let mut attempt = 0u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    attempt += 1;
                    if attempt >= self.max_attempts || !retryable(&err) {
                        return Err(err);
                    }
                    let backoff = self.base_delay * 2u32.saturating_pow(attempt - 1);
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}
