use crate::domain::ports::{EventPublisher, TransactionRepository};
use crate::domain::transaction::Transaction;
use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::Instant;
use uuid::Uuid;

/// A thread-safe in-memory transaction repository.
///
/// Uses `Arc<RwLock<HashMap<Uuid, Transaction>>>` to allow shared concurrent access.
/// Ideal for testing or single-run batches where persistence is not required.
#[derive(Default, Clone)]
pub struct InMemoryTransactionStore {
    transactions: Arc<RwLock<HashMap<Uuid, Transaction>>>,
}

impl InMemoryTransactionStore {
    /// Creates a new, empty in-memory transaction store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionRepository for InMemoryTransactionStore {
    async fn upsert(&self, tx: Transaction) -> Result<()> {
        let mut transactions = self.transactions.write().await;
        transactions.insert(tx.transaction_id, tx);
        Ok(())
    }

    async fn get(&self, transaction_id: Uuid) -> Result<Option<Transaction>> {
        let transactions = self.transactions.read().await;
        Ok(transactions.get(&transaction_id).cloned())
    }

    async fn list(&self) -> Result<Vec<Transaction>> {
        let transactions = self.transactions.read().await;
        Ok(transactions.values().cloned().collect())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PublishedMessage {
    pub key: String,
    pub document: Value,
}

/// An in-process topic that keeps every published message in arrival order.
#[derive(Default, Clone)]
pub struct InMemoryTopic {
    messages: Arc<RwLock<Vec<PublishedMessage>>>,
}

impl InMemoryTopic {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn messages(&self) -> Vec<PublishedMessage> {
        self.messages.read().await.clone()
    }
}

#[async_trait]
impl EventPublisher for InMemoryTopic {
    async fn publish(&self, deadline: Instant, key: &str, document: &Value) -> Result<()> {
        if Instant::now() >= deadline {
            return Err(PipelineError::DeadlineExceeded);
        }
        self.messages.write().await.push(PublishedMessage {
            key: key.to_string(),
            document: document.clone(),
        });
        Ok(())
    }
}
