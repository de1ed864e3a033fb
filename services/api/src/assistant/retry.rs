//! services/api/src/assistant/retry.rs
//!
//! Bounded retry with exponential backoff for calls that can fail transiently.
//! A caller that loses interest cancels through a `CancellationToken`; both the
//! in-flight attempt and any pending backoff sleep stop immediately.

use beyond_bark_core::ports::{PortError, PortResult};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Always at least 1.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
        }
    }

    /// The pause after the `retry`-th failure (0-based): `base * 2^retry`, capped.
    pub fn delay_for(&self, retry: u32) -> Duration {
        2u32.checked_pow(retry)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Runs `operation` until it succeeds, fails with a non-retryable error,
    /// runs out of attempts, or `cancel` fires. The closure receives the
    /// 1-based attempt number.
    pub async fn run<T, F, Fut>(&self, cancel: &CancellationToken, mut operation: F) -> PortResult<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = PortResult<T>>,
    {
        let mut attempt = 1;
        loop {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(PortError::Cancelled),
                result = operation(attempt) => result,
            };

            let error = match result {
                Ok(value) => return Ok(value),
                Err(error) if !error.is_retryable() => return Err(error),
                Err(error) if attempt >= self.max_attempts => {
                    return Err(PortError::RetriesExhausted {
                        attempts: attempt,
                        last: Box::new(error),
                    })
                }
                Err(error) => error,
            };

            let delay = self.delay_for(attempt - 1);
            warn!(
                attempt,
                max_attempts = self.max_attempts,
                delay_ms = delay.as_millis() as u64,
                "Retrying after transient failure: {}",
                error
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(PortError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
            attempt += 1;
        }
    }
}
