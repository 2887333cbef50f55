use chrono::{DateTime, FixedOffset, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    #[default]
    Queued,
    Processed,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Queued => "queued",
            TransactionStatus::Processed => "processed",
            TransactionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A financial transaction as stored by the repository.
///
/// `transaction_id` is the idempotency key: writing the same id twice
/// overwrites the previous record.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Transaction {
    pub transaction_id: Uuid,
    pub user_id: Uuid,
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
    pub status: TransactionStatus,
}

impl Transaction {
    /// Creates a transaction in the `queued` state, normalizing the timestamp to UTC.
    pub fn queued<Tz: chrono::TimeZone>(
        transaction_id: Uuid,
        user_id: Uuid,
        amount: Decimal,
        timestamp: DateTime<Tz>,
    ) -> Self {
        Self {
            transaction_id,
            user_id,
            amount,
            timestamp: timestamp.with_timezone(&Utc),
            status: TransactionStatus::Queued,
        }
    }
}

/// An intake request, as received from a client before it is recorded.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct NewTransaction {
    pub transaction_id: Uuid,
    pub user_id: Uuid,
    /// Parsed from its text form so the scale and every digit survive intake.
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub timestamp: DateTime<FixedOffset>,
}

impl From<NewTransaction> for Transaction {
    fn from(request: NewTransaction) -> Self {
        Transaction::queued(
            request.transaction_id,
            request.user_id,
            request.amount,
            request.timestamp,
        )
    }
}
