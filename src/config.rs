use crate::application::retry::RetryPolicy;
use crate::error::{PipelineError, Result};
use std::time::Duration;

pub const DEFAULT_QUEUE_CAPACITY: usize = 100;
pub const DEFAULT_PROCESSING_DELAY: Duration = Duration::from_millis(150);
pub const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);

/// Values the pipeline is built from. Fixed once the pipeline is constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub queue_capacity: usize,
    pub processing_delay: Duration,
    pub publish_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            processing_delay: DEFAULT_PROCESSING_DELAY,
            publish_timeout: DEFAULT_PUBLISH_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }
}

impl PipelineConfig {
    pub fn with_queue_capacity(self, queue_capacity: usize) -> Self {
        Self {
            queue_capacity,
            ..self
        }
    }

    pub fn with_processing_delay(self, processing_delay: Duration) -> Self {
        Self {
            processing_delay,
            ..self
        }
    }

    pub fn with_publish_timeout(self, publish_timeout: Duration) -> Self {
        Self {
            publish_timeout,
            ..self
        }
    }

    pub fn with_retry(self, max_retries: u32, backoff_base: Duration) -> Self {
        Self {
            retry: RetryPolicy::new(max_retries, backoff_base),
            ..self
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 {
            return Err(PipelineError::ConfigError(
                "queue capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.queue_capacity, 100);
        assert_eq!(config.processing_delay, Duration::from_millis(150));
        assert_eq!(config.publish_timeout, Duration::from_secs(5));
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.backoff_base, Duration::from_millis(200));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = PipelineConfig::default().with_queue_capacity(0);
        assert!(matches!(
            config.validate(),
            Err(PipelineError::ConfigError(_))
        ));
    }
}
