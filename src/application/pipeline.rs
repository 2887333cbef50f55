use super::queue::WorkQueue;
use super::worker::ProcessingLoop;
use crate::config::PipelineConfig;
use crate::domain::ports::{EventPublisherRef, EventValidatorRef, TransactionRepositoryRef};
use crate::error::Result;
use crate::telemetry::PipelineMetrics;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Wires the queue and the processing loop to their collaborators.
///
/// The validator and publisher are optional. Whatever is set when `build` is
/// called is what the loop uses for its whole lifetime.
pub struct TransactionPipeline {
    config: PipelineConfig,
    repository: TransactionRepositoryRef,
    validator: Option<EventValidatorRef>,
    publisher: Option<EventPublisherRef>,
    metrics: Option<Arc<PipelineMetrics>>,
}

impl TransactionPipeline {
    pub fn new(config: PipelineConfig, repository: TransactionRepositoryRef) -> Self {
        Self {
            config,
            repository,
            validator: None,
            publisher: None,
            metrics: None,
        }
    }

    pub fn with_validator(mut self, validator: EventValidatorRef) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn with_publisher(mut self, publisher: EventPublisherRef) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<PipelineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Creates the queue and its consumer without starting the consumer.
    pub fn build(self) -> Result<(WorkQueue, ProcessingLoop)> {
        self.config.validate()?;
        let metrics = match self.metrics {
            Some(metrics) => metrics,
            None => Arc::new(PipelineMetrics::new()?),
        };
        let (queue, receiver) = WorkQueue::bounded(self.config.queue_capacity, metrics.clone())?;
        let worker = ProcessingLoop::new(
            receiver,
            self.repository,
            self.validator,
            self.publisher,
            self.config,
            metrics,
        );
        Ok((queue, worker))
    }

    /// Builds the pipeline and runs the consumer on its own task.
    pub fn spawn(self, cancel: CancellationToken) -> Result<(WorkQueue, JoinHandle<()>)> {
        let (queue, worker) = self.build()?;
        let handle = tokio::spawn(worker.run(cancel));
        Ok((queue, handle))
    }
}
