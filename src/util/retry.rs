//! Fixed-delay retry for rate-limited dispatches.

use std::future::Future;
use std::time::Duration;

use crate::error::PalaverError;

/// Retry policy for provider dispatch.
///
/// Only rate-limit errors are retried; any other failure is returned to the
/// caller on the first occurrence. When attempts are exhausted the original
/// rate-limit error is returned unwrapped.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Fixed delay between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(20),
        }
    }
}

impl RetryPolicy {
    /// Execute an async operation with retry.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, PalaverError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, PalaverError>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    attempt += 1;
                    if !e.is_rate_limited() || attempt >= self.max_attempts {
                        return Err(e);
                    }

                    tracing::warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "Rate limited, retrying after fixed delay"
                    );
                    tokio::time::sleep(self.delay).await;
                }
            }
        }
    }
}
