//! Bounded retry with linear backoff for pipeline stages

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::Result;

/// Retry policy: total attempts = 1 + `retries`
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure
    pub retries: u32,
    /// Delay before attempt n is `base_delay * n`
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 2,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Policy with a given retry count and the default backoff
    pub fn with_retries(retries: u32) -> Self {
        Self {
            retries,
            ..Self::default()
        }
    }

    /// Run an operation, retrying transient failures
    ///
    /// Only errors classified transient by [`crate::Error::is_transient`]
    /// are retried; anything else propagates immediately. The last error
    /// propagates once attempts are exhausted.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.retries => {
                    attempt += 1;
                    let delay = self.base_delay * attempt;
                    warn!(
                        what,
                        attempt,
                        max_retries = self.retries,
                        error = %err,
                        "Transient failure, retrying after backoff"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
