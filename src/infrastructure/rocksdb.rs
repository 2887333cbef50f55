use crate::domain::ports::TransactionRepository;
use crate::domain::transaction::Transaction;
use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Column Family for storing transaction records.
pub const CF_TRANSACTIONS: &str = "transactions";

/// A persistent transaction repository backed by RocksDB.
///
/// Records are keyed by the 16 bytes of the transaction id and stored as JSON,
/// so a repeated write of the same id replaces the previous value.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the "transactions" column family exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_transactions = ColumnFamilyDescriptor::new(CF_TRANSACTIONS, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_transactions])?;

        Ok(Self { db: Arc::new(db) })
    }

    fn missing_cf() -> PipelineError {
        PipelineError::StorageError("Transactions column family not found".to_string())
    }
}

#[async_trait]
impl TransactionRepository for RocksDBStore {
    async fn upsert(&self, tx: Transaction) -> Result<()> {
        let cf = self.db.cf_handle(CF_TRANSACTIONS).ok_or_else(Self::missing_cf)?;

        let key = tx.transaction_id.into_bytes();
        let value = serde_json::to_vec(&tx)?;

        self.db.put_cf(&cf, key, value)?;

        Ok(())
    }

    async fn get(&self, transaction_id: Uuid) -> Result<Option<Transaction>> {
        let cf = self.db.cf_handle(CF_TRANSACTIONS).ok_or_else(Self::missing_cf)?;

        match self.db.get_cf(&cf, transaction_id.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<Transaction>> {
        let cf = self.db.cf_handle(CF_TRANSACTIONS).ok_or_else(Self::missing_cf)?;

        let mut transactions = Vec::new();
        for item in self.db.iterator_cf(cf, rocksdb::IteratorMode::Start) {
            let (_key, value) = item?;
            transactions.push(serde_json::from_slice(&value)?);
        }

        Ok(transactions)
    }
}
