use super::transaction::Transaction;
use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio::time::Instant;
use uuid::Uuid;

#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Inserts or overwrites the record keyed by `tx.transaction_id`.
    async fn upsert(&self, tx: Transaction) -> Result<()>;
    async fn get(&self, transaction_id: Uuid) -> Result<Option<Transaction>>;
    async fn list(&self) -> Result<Vec<Transaction>>;
}

/// Checks an event document against a fixed schema.
pub trait EventValidator: Send + Sync {
    fn validate(&self, document: &Value) -> Result<()>;
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Delivers `document` keyed by `key`. Implementations must give up once `deadline` passes.
    async fn publish(&self, deadline: Instant, key: &str, document: &Value) -> Result<()>;
}

pub type TransactionRepositoryRef = Arc<dyn TransactionRepository>;
pub type EventValidatorRef = Arc<dyn EventValidator>;
pub type EventPublisherRef = Arc<dyn EventPublisher>;
