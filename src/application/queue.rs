use crate::domain::transaction::Transaction;
use crate::error::{PipelineError, Result};
use crate::telemetry::PipelineMetrics;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::warn;

/// Producer side of the bounded work queue.
///
/// Cloning hands out another producer for the same buffer. Once every clone is
/// dropped, the processing loop drains whatever is left and stops.
#[derive(Clone)]
pub struct WorkQueue {
    sender: mpsc::Sender<Transaction>,
    metrics: Arc<PipelineMetrics>,
}

impl WorkQueue {
    /// Creates a queue holding at most `capacity` transactions, returning the
    /// receiving end for the single consumer.
    pub fn bounded(
        capacity: usize,
        metrics: Arc<PipelineMetrics>,
    ) -> Result<(Self, mpsc::Receiver<Transaction>)> {
        if capacity == 0 {
            return Err(PipelineError::ConfigError(
                "queue capacity must be greater than zero".to_string(),
            ));
        }
        let (sender, receiver) = mpsc::channel(capacity);
        Ok((Self { sender, metrics }, receiver))
    }

    /// Hands `tx` to the processing loop without waiting.
    ///
    /// Returns `false` and drops the transaction when the buffer is full or the
    /// loop has stopped.
    pub fn enqueue(&self, tx: Transaction) -> bool {
        match self.sender.try_send(tx) {
            Ok(()) => {
                self.metrics.set_queue_current(self.len());
                true
            }
            Err(TrySendError::Full(tx)) => {
                warn!(tx_id = %tx.transaction_id, "transaction queue full; dropping");
                self.metrics.inc_dropped();
                false
            }
            Err(TrySendError::Closed(tx)) => {
                warn!(tx_id = %tx.transaction_id, "transaction worker stopped; dropping");
                self.metrics.inc_dropped();
                false
            }
        }
    }

    pub fn capacity(&self) -> usize {
        self.sender.max_capacity()
    }

    /// Number of transactions currently buffered.
    pub fn len(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
