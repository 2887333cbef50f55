use super::transaction::Transaction;
use crate::error::Result;
use chrono::SecondsFormat;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind tag carried by every event emitted after a transaction is processed.
pub const TRANSACTION_CREATED: &str = "transaction.created";
/// Version of the `transaction.created` schema the events conform to.
pub const SCHEMA_VERSION: u32 = 1;

/// Immutable snapshot of a processed transaction, published downstream.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct TransactionEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub version: u32,
    pub id: String,
    pub user_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub timestamp: String,
}

impl TransactionEvent {
    pub fn created(tx: &Transaction) -> Self {
        Self {
            kind: TRANSACTION_CREATED.to_string(),
            version: SCHEMA_VERSION,
            id: tx.transaction_id.to_string(),
            user_id: tx.user_id.to_string(),
            amount: tx.amount,
            timestamp: tx.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    /// The event as a generic JSON document, the shape handed to validators and publishers.
    pub fn to_document(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}
