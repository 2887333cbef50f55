use crate::domain::transaction::Transaction;
use crate::error::Result;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::io::Write;
use uuid::Uuid;

/// Writes stored transactions and per-user reports as CSV.
pub struct TransactionWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> TransactionWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    /// Writes `transaction_id,user_id,amount,timestamp,status` rows, ordered by
    /// timestamp and then id.
    pub fn write_transactions(&mut self, mut transactions: Vec<Transaction>) -> Result<()> {
        transactions.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then(a.transaction_id.cmp(&b.transaction_id))
        });
        for tx in &transactions {
            self.writer.serialize(tx)?;
        }
        self.writer.flush()?;
        Ok(())
    }

    pub fn write_report(&mut self, totals: &BTreeMap<Uuid, Decimal>) -> Result<()> {
        self.writer.write_record(["user_id", "total"])?;
        for (user_id, total) in totals {
            self.writer
                .write_record([user_id.to_string(), total.normalize().to_string()])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
