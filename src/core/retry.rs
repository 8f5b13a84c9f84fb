//! Retry policy for calls to the generative service.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Fixed-delay retry policy
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including first try)
    pub max_attempts: u32,

    /// Delay between attempts
    pub delay: Duration,
}

impl RetryPolicy {
    /// One retry after `delay`
    pub fn once(delay: Duration) -> Self {
        Self {
            max_attempts: 2,
            delay,
        }
    }

    /// Check if we should retry based on attempt count
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Run `call` until it succeeds or attempts run out.
    ///
    /// Returns the number of attempts made alongside the last error.
    pub async fn run<T, F, Fut>(&self, label: &str, mut call: F) -> Result<T, (u32, anyhow::Error)>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if self.should_retry(attempt) => {
                    warn!(
                        call = label,
                        attempt,
                        delay_ms = self.delay.as_millis() as u64,
                        error = %e,
                        "Generation call failed, retrying"
                    );
                    tokio::time::sleep(self.delay).await;
                }
                Err(e) => return Err((attempt, e)),
            }
        }
    }
}
