use crate::domain::ports::EventPublisher;
use crate::error::PipelineError;
use serde_json::Value;
use std::ops::RangeInclusive;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(200);

/// Bounded retry with attempt-indexed exponential backoff and no jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, DEFAULT_BACKOFF_BASE)
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_base: Duration) -> Self {
        Self {
            max_retries,
            backoff_base,
        }
    }

    /// Attempt indices, `0..=max_retries`.
    pub fn attempts(&self) -> RangeInclusive<u32> {
        0..=self.max_retries
    }

    /// Sleep inserted after failed attempt `attempt`: `backoff_base * 2^attempt`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.backoff_base.saturating_mul(factor)
    }

    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }
}

#[derive(Error, Debug)]
#[error("publish failed after {attempts} attempts: {last_error}")]
pub struct PublishExhausted {
    pub attempts: u32,
    pub last_error: PipelineError,
}

/// Publishes `document` under `policy`, sharing one deadline across every attempt.
///
/// Returns the number of attempts made on success. The deadline is not checked
/// between attempts; the publisher is expected to fail fast once it has passed.
pub async fn publish_with_retry(
    publisher: &dyn EventPublisher,
    policy: &RetryPolicy,
    publish_timeout: Duration,
    key: &str,
    document: &Value,
) -> Result<u32, PublishExhausted> {
    let deadline = Instant::now() + publish_timeout;
    let mut attempt = 0;
    loop {
        debug!(tx_id = key, attempt = attempt + 1, "publish attempt");
        match publisher.publish(deadline, key, document).await {
            Ok(()) => return Ok(attempt + 1),
            Err(e) if policy.should_retry(attempt) => {
                let backoff = policy.backoff(attempt);
                warn!(tx_id = key, error = %e, sleep = ?backoff, "publish retrying");
                sleep(backoff).await;
                attempt += 1;
            }
            Err(e) => {
                return Err(PublishExhausted {
                    attempts: attempt + 1,
                    last_error: e,
                });
            }
        }
    }
}
