//! Retry policy for managed write transactions.
//!
//! Mirrors what the official Bolt drivers do for managed transactions:
//! transient failures are retried with exponential backoff until a total
//! time budget is spent. The last error is returned unchanged.

use std::future::Future;
use std::time::Duration;

use roster_core::ConnectionSettings;
use tokio::time::Instant;

use crate::client::GraphError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// No retry is started once this much time has elapsed.
    pub max_retry_time: Duration,
    pub initial_delay: Duration,
    /// Never below 1.0.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&ConnectionSettings::default())
    }
}

impl RetryPolicy {
    pub fn from_settings(settings: &ConnectionSettings) -> Self {
        Self {
            max_retry_time: Duration::from_millis(settings.max_retry_time_ms),
            initial_delay: Duration::from_millis(settings.initial_retry_delay_ms),
            multiplier: settings.retry_delay_multiplier.max(1.0),
        }
    }

    /// A policy that runs the work exactly once.
    pub fn no_retry() -> Self {
        Self {
            max_retry_time: Duration::ZERO,
            initial_delay: Duration::ZERO,
            multiplier: 1.0,
        }
    }

    /// Run `work`, retrying transient failures within the time budget.
    pub async fn run<T, F, Fut>(&self, mut work: F) -> Result<T, GraphError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GraphError>>,
    {
        let started = Instant::now();
        let mut delay = self.initial_delay;
        let mut attempt: u32 = 1;

        loop {
            match work().await {
                Ok(value) => return Ok(value),
                Err(e)
                    if e.is_transient()
                        && started.elapsed().saturating_add(delay) < self.max_retry_time =>
                {
                    tracing::warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient failure in write transaction, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay = self.next_delay(delay);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn next_delay(&self, delay: Duration) -> Duration {
        Duration::try_from_secs_f64(delay.as_secs_f64() * self.multiplier)
            .unwrap_or(Duration::MAX)
    }
}
