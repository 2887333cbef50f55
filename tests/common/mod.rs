#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use std::fs::File;
use std::io::Error;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::time::Instant;
use txflow::domain::ports::{EventPublisher, EventValidator, TransactionRepository};
use txflow::domain::transaction::Transaction;
use txflow::error::{PipelineError, Result};
use uuid::Uuid;

pub fn transaction(amount: Decimal) -> Transaction {
    Transaction::queued(
        Uuid::new_v4(),
        Uuid::new_v4(),
        amount,
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
    )
}

/// Fails the first `failures` calls, then succeeds. Records the time and
/// deadline of every call.
pub struct FlakyPublisher {
    failures: u32,
    calls: AtomicU32,
    call_times: Mutex<Vec<Instant>>,
    deadlines: Mutex<Vec<Instant>>,
}

impl FlakyPublisher {
    pub fn failing_first(failures: u32) -> Self {
        Self {
            failures,
            calls: AtomicU32::new(0),
            call_times: Mutex::new(Vec::new()),
            deadlines: Mutex::new(Vec::new()),
        }
    }

    pub fn always_failing() -> Self {
        Self::failing_first(u32::MAX)
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.call_times.lock().unwrap().clone()
    }

    pub fn deadlines(&self) -> Vec<Instant> {
        self.deadlines.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventPublisher for FlakyPublisher {
    async fn publish(&self, deadline: Instant, _key: &str, _document: &Value) -> Result<()> {
        self.call_times.lock().unwrap().push(Instant::now());
        self.deadlines.lock().unwrap().push(deadline);
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            Err(PipelineError::PublishError(format!("attempt {} refused", call + 1)))
        } else {
            Ok(())
        }
    }
}

pub struct RejectingValidator;

impl EventValidator for RejectingValidator {
    fn validate(&self, _document: &Value) -> Result<()> {
        Err(PipelineError::ValidationError("schema mismatch".to_string()))
    }
}

/// A repository whose writes always fail.
pub struct UnavailableRepository;

#[async_trait]
impl TransactionRepository for UnavailableRepository {
    async fn upsert(&self, _tx: Transaction) -> Result<()> {
        Err(PipelineError::StorageError("database unavailable".to_string()))
    }

    async fn get(&self, _transaction_id: Uuid) -> Result<Option<Transaction>> {
        Ok(None)
    }

    async fn list(&self) -> Result<Vec<Transaction>> {
        Ok(Vec::new())
    }
}

pub fn generate_csv(path: &Path, rows: usize, user_id: Uuid) -> std::result::Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);

    wtr.write_record(["transaction_id", "user_id", "amount", "timestamp"])?;

    for i in 1..=rows {
        wtr.write_record([
            Uuid::new_v4().to_string(),
            user_id.to_string(),
            format!("{}.50", i),
            format!("2024-01-01T00:00:{:02}Z", i % 60),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
