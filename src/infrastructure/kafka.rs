use crate::domain::ports::EventPublisher;
use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use serde_json::Value;
use std::time::Duration;
use tokio::time::{Instant, timeout_at};

/// Publishes events as JSON to a Kafka topic, keyed by transaction id.
pub struct KafkaPublisher {
    producer: FutureProducer,
    topic: String,
}

impl KafkaPublisher {
    /// `brokers` is a comma-separated `host:port` list. `delivery_timeout` caps
    /// how long librdkafka keeps a message in flight; it should match the
    /// publish timeout the pipeline hands out as a deadline.
    pub fn new(brokers: &str, topic: impl Into<String>, delivery_timeout: Duration) -> Result<Self> {
        let timeout_ms = delivery_timeout.as_millis().max(1);
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", timeout_ms.to_string())
            .create()
            .map_err(|e| PipelineError::PublishError(format!("create producer: {}", e)))?;
        Ok(Self {
            producer,
            topic: topic.into(),
        })
    }
}

#[async_trait]
impl EventPublisher for KafkaPublisher {
    async fn publish(&self, deadline: Instant, key: &str, document: &Value) -> Result<()> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(PipelineError::DeadlineExceeded);
        }

        let payload = serde_json::to_vec(document)?;
        let record = FutureRecord::to(&self.topic).key(key).payload(&payload);

        // The send timeout only bounds enqueueing into the local producer
        // queue; delivery itself is bounded here.
        match timeout_at(deadline, self.producer.send(record, Timeout::After(remaining))).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err((e, _))) => Err(PipelineError::PublishError(e.to_string())),
            Err(_) => Err(PipelineError::DeadlineExceeded),
        }
    }
}
