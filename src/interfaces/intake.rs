use crate::application::queue::WorkQueue;
use crate::domain::ports::TransactionRepositoryRef;
use crate::domain::transaction::{NewTransaction, Transaction, TransactionStatus};
use crate::error::Result;
use crate::telemetry::{FailureReason, PipelineMetrics};
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

/// What the caller learns about a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntakeReceipt {
    pub transaction_id: Uuid,
    pub status: TransactionStatus,
    /// `false` when the queue was full; the record then stays `queued`.
    pub accepted: bool,
}

/// Entry point for new transactions: records them as `queued`, then hands them
/// to the work queue.
pub struct TransactionIntake {
    repository: TransactionRepositoryRef,
    queue: WorkQueue,
    metrics: Arc<PipelineMetrics>,
}

impl TransactionIntake {
    pub fn new(
        repository: TransactionRepositoryRef,
        queue: WorkQueue,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            repository,
            queue,
            metrics,
        }
    }

    pub async fn submit(&self, request: NewTransaction) -> Result<IntakeReceipt> {
        let tx = Transaction::from(request);
        let transaction_id = tx.transaction_id;

        if let Err(e) = self.repository.upsert(tx.clone()).await {
            error!(tx_id = %transaction_id, error = %e, "failed to persist queued transaction");
            self.metrics.inc_failed(FailureReason::Db);
            return Err(e);
        }

        let accepted = self.queue.enqueue(tx);
        Ok(IntakeReceipt {
            transaction_id,
            status: TransactionStatus::Queued,
            accepted,
        })
    }

    /// Counts a request that was rejected before reaching the repository.
    pub fn record_rejected(&self) {
        self.metrics.inc_failed(FailureReason::Validation);
    }
}
