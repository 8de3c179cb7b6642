//! Bounded retry with exponential backoff

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::failure::FailureReason;
use crate::telemetry::{Telemetry, TelemetryEvent};

/// How many times to try a remote call and how long to wait after each failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Delay after the first failure; doubles for every later one
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    /// Three attempts, waiting 1s, 2s and 4s
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// No waiting between attempts
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
        }
    }

    /// Delay after failed attempt `attempt` (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1u32 << exponent)
    }

    /// Total time spent waiting when every attempt fails
    pub fn worst_case_wait(&self) -> Duration {
        (1..=self.max_attempts)
            .map(|a| self.delay_after(a))
            .fold(Duration::ZERO, |acc, d| acc.saturating_add(d))
    }

    /// Run `call` until it succeeds or attempts run out.
    ///
    /// Attempts are strictly sequential. Each failure is recorded and followed
    /// by its backoff delay, the last one included, so the caller only falls
    /// back once the full schedule has elapsed. `Unavailable` is not retried.
    pub async fn run<T, F, Fut>(
        &self,
        operation: &str,
        telemetry: &Arc<dyn Telemetry>,
        mut call: F,
    ) -> Result<T, FailureReason>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, FailureReason>>,
    {
        let started = Instant::now();
        let mut last = None;

        for attempt in 1..=self.max_attempts.max(1) {
            match call(attempt).await {
                Ok(value) => {
                    telemetry.record(TelemetryEvent::RemoteSucceeded {
                        operation: operation.to_string(),
                        attempts: attempt,
                        elapsed_ms: started.elapsed().as_millis() as u64,
                    });
                    return Ok(value);
                }
                Err(reason) => {
                    telemetry.record(TelemetryEvent::RemoteAttemptFailed {
                        operation: operation.to_string(),
                        attempt,
                        reason: reason.to_string(),
                    });
                    if !reason.is_retryable() {
                        return Err(reason);
                    }
                    let delay = self.delay_after(attempt);
                    debug!(operation, attempt, ?delay, error = %reason, "Remote attempt failed");
                    tokio::time::sleep(delay).await;
                    last = Some(reason);
                }
            }
        }

        Err(last.unwrap_or(FailureReason::Unavailable))
    }
}
