use super::retry::publish_with_retry;
use crate::config::PipelineConfig;
use crate::domain::event::TransactionEvent;
use crate::domain::ports::{EventPublisherRef, EventValidatorRef, TransactionRepositoryRef};
use crate::domain::transaction::{Transaction, TransactionStatus};
use crate::telemetry::{FailureReason, PipelineMetrics};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Terminal state of one dequeued transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The repository rejected the `processed` write; nothing was published.
    PersistFailed,
    /// The event did not pass the schema gate; nothing was published.
    ValidationFailed,
    Published { attempts: u32 },
    PublishExhausted { attempts: u32 },
    PublishSkipped,
}

/// The single consumer of the work queue.
pub struct ProcessingLoop {
    receiver: mpsc::Receiver<Transaction>,
    repository: TransactionRepositoryRef,
    validator: Option<EventValidatorRef>,
    publisher: Option<EventPublisherRef>,
    config: PipelineConfig,
    metrics: Arc<PipelineMetrics>,
}

impl ProcessingLoop {
    pub(crate) fn new(
        receiver: mpsc::Receiver<Transaction>,
        repository: TransactionRepositoryRef,
        validator: Option<EventValidatorRef>,
        publisher: Option<EventPublisherRef>,
        config: PipelineConfig,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            receiver,
            repository,
            validator,
            publisher,
            config,
            metrics,
        }
    }

    /// Processes queued transactions in arrival order until `cancel` fires or
    /// every producer is gone and the buffer is empty.
    ///
    /// Cancellation is observed between items only: the item in flight runs to
    /// completion and anything still buffered is abandoned.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!("transaction worker started");
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                next = self.receiver.recv() => match next {
                    Some(tx) => {
                        self.metrics.set_queue_current(self.receiver.len());
                        self.process(tx).await;
                    }
                    None => break,
                },
            }
        }
        let abandoned = self.receiver.len();
        self.receiver.close();
        self.metrics.set_queue_current(0);
        info!(abandoned, "transaction worker stopped");
    }

    /// Runs one transaction through delay, persistence, event validation and publication.
    pub async fn process(&self, mut tx: Transaction) -> ProcessOutcome {
        let tx_id = tx.transaction_id;

        if !self.config.processing_delay.is_zero() {
            sleep(self.config.processing_delay).await;
        }

        tx.status = TransactionStatus::Processed;
        if let Err(e) = self.repository.upsert(tx.clone()).await {
            error!(%tx_id, error = %e, "db upsert failed");
            self.metrics.inc_failed(FailureReason::Db);
            return ProcessOutcome::PersistFailed;
        }
        self.metrics.inc_processed();
        info!(%tx_id, "transaction processed");

        let document = match TransactionEvent::created(&tx).to_document() {
            Ok(document) => document,
            Err(e) => {
                error!(%tx_id, error = %e, "event serialization failed");
                self.metrics.inc_failed(FailureReason::Schema);
                return ProcessOutcome::ValidationFailed;
            }
        };

        if let Some(validator) = &self.validator
            && let Err(e) = validator.validate(&document)
        {
            error!(%tx_id, error = %e, "schema validation failed");
            self.metrics.inc_failed(FailureReason::Schema);
            return ProcessOutcome::ValidationFailed;
        }

        let Some(publisher) = &self.publisher else {
            warn!(%tx_id, "event publisher not configured; skipping publish");
            self.metrics.inc_publish_skipped();
            return ProcessOutcome::PublishSkipped;
        };

        let key = tx_id.to_string();
        match publish_with_retry(
            publisher.as_ref(),
            &self.config.retry,
            self.config.publish_timeout,
            &key,
            &document,
        )
        .await
        {
            Ok(attempts) => {
                info!(%tx_id, attempts, "event published");
                self.metrics.inc_published();
                ProcessOutcome::Published { attempts }
            }
            Err(exhausted) => {
                error!(
                    %tx_id,
                    attempts = exhausted.attempts,
                    error = %exhausted.last_error,
                    "event publish failed permanently"
                );
                self.metrics.inc_failed(FailureReason::Kafka);
                ProcessOutcome::PublishExhausted {
                    attempts: exhausted.attempts,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::pipeline::TransactionPipeline;
    use crate::domain::ports::{EventPublisher, EventValidator, TransactionRepository};
    use crate::error::{PipelineError, Result};
    use crate::infrastructure::in_memory::{InMemoryTopic, InMemoryTransactionStore};
    use async_trait::async_trait;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use serde_json::Value;
    use std::time::Duration;
    use tokio::time::Instant;
    use uuid::Uuid;

    struct RejectAll;

    impl EventValidator for RejectAll {
        fn validate(&self, _document: &Value) -> Result<()> {
            Err(PipelineError::ValidationError("rejected".into()))
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl TransactionRepository for BrokenStore {
        async fn upsert(&self, _tx: Transaction) -> Result<()> {
            Err(PipelineError::StorageError("connection refused".into()))
        }

        async fn get(&self, _id: Uuid) -> Result<Option<Transaction>> {
            Ok(None)
        }

        async fn list(&self) -> Result<Vec<Transaction>> {
            Ok(Vec::new())
        }
    }

    struct AlwaysDown;

    #[async_trait]
    impl EventPublisher for AlwaysDown {
        async fn publish(&self, _deadline: Instant, _key: &str, _document: &Value) -> Result<()> {
            Err(PipelineError::PublishError("broker down".into()))
        }
    }

    fn sample() -> Transaction {
        Transaction::queued(Uuid::new_v4(), Uuid::new_v4(), dec!(25.00), Utc::now())
    }

    fn fast_config() -> PipelineConfig {
        PipelineConfig::default()
            .with_processing_delay(Duration::ZERO)
            .with_retry(1, Duration::from_millis(10))
    }

    #[tokio::test]
    async fn test_process_publishes_processed_event() {
        let store = Arc::new(InMemoryTransactionStore::new());
        let topic = Arc::new(InMemoryTopic::new());
        let (_queue, worker) = TransactionPipeline::new(fast_config(), store.clone())
            .with_publisher(topic.clone())
            .build()
            .unwrap();

        let tx = sample();
        let outcome = worker.process(tx.clone()).await;

        assert_eq!(outcome, ProcessOutcome::Published { attempts: 1 });
        let stored = store.get(tx.transaction_id).await.unwrap().unwrap();
        assert_eq!(stored.status, TransactionStatus::Processed);
        let messages = topic.messages().await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].key, tx.transaction_id.to_string());
        assert_eq!(messages[0].document["type"], "transaction.created");
    }

    #[tokio::test]
    async fn test_persist_failure_stops_the_item() {
        let topic = Arc::new(InMemoryTopic::new());
        let (_queue, worker) = TransactionPipeline::new(fast_config(), Arc::new(BrokenStore))
            .with_publisher(topic.clone())
            .build()
            .unwrap();

        let outcome = worker.process(sample()).await;

        assert_eq!(outcome, ProcessOutcome::PersistFailed);
        assert_eq!(worker.metrics.failed_total(FailureReason::Db), 1);
        assert_eq!(worker.metrics.processed_total(), 0);
        assert!(topic.messages().await.is_empty());
    }

    #[tokio::test]
    async fn test_validation_failure_skips_publish() {
        let store = Arc::new(InMemoryTransactionStore::new());
        let topic = Arc::new(InMemoryTopic::new());
        let (_queue, worker) = TransactionPipeline::new(fast_config(), store.clone())
            .with_validator(Arc::new(RejectAll))
            .with_publisher(topic.clone())
            .build()
            .unwrap();

        let tx = sample();
        let outcome = worker.process(tx.clone()).await;

        assert_eq!(outcome, ProcessOutcome::ValidationFailed);
        assert_eq!(worker.metrics.failed_total(FailureReason::Schema), 1);
        assert!(topic.messages().await.is_empty());
        let stored = store.get(tx.transaction_id).await.unwrap().unwrap();
        assert_eq!(stored.status, TransactionStatus::Processed);
    }

    #[tokio::test]
    async fn test_missing_publisher_is_skipped() {
        let store = Arc::new(InMemoryTransactionStore::new());
        let (_queue, worker) = TransactionPipeline::new(fast_config(), store.clone())
            .build()
            .unwrap();

        let tx = sample();
        assert_eq!(worker.process(tx.clone()).await, ProcessOutcome::PublishSkipped);
        assert_eq!(worker.metrics.publish_skipped_total(), 1);
        let stored = store.get(tx.transaction_id).await.unwrap().unwrap();
        assert_eq!(stored.status, TransactionStatus::Processed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_publish_exhaustion_is_counted() {
        let (_queue, worker) =
            TransactionPipeline::new(fast_config(), Arc::new(InMemoryTransactionStore::new()))
                .with_publisher(Arc::new(AlwaysDown))
                .build()
                .unwrap();

        let outcome = worker.process(sample()).await;

        assert_eq!(outcome, ProcessOutcome::PublishExhausted { attempts: 2 });
        assert_eq!(worker.metrics.failed_total(FailureReason::Kafka), 1);
        assert_eq!(worker.metrics.published_total(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_processing_delay_is_applied() {
        let config = fast_config().with_processing_delay(Duration::from_millis(150));
        let (_queue, worker) =
            TransactionPipeline::new(config, Arc::new(InMemoryTransactionStore::new()))
                .build()
                .unwrap();

        let start = Instant::now();
        worker.process(sample()).await;
        assert_eq!(start.elapsed(), Duration::from_millis(150));
    }
}
