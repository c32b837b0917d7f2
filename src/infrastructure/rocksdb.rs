use crate::domain::ports::TransactionStore;
use crate::domain::transaction::Transaction;
use crate::error::{GatewayError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Options, WriteBatch};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Column Family for storing every payment attempt, keyed by transaction id.
pub const CF_TRANSACTIONS: &str = "transactions";
/// Column Family mapping a payment id to its latest transaction id.
pub const CF_PAYMENTS: &str = "payments";

/// A persistent transaction store using RocksDB.
///
/// An attempt and its payment index entry are written in one batch, so a
/// reader never sees an index entry pointing at a missing attempt.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families ("transactions" and
    /// "payments") exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_transactions = ColumnFamilyDescriptor::new(CF_TRANSACTIONS, Options::default());
        let cf_payments = ColumnFamilyDescriptor::new(CF_PAYMENTS, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_transactions, cf_payments])?;

        Ok(Self { db: Arc::new(db) })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            GatewayError::InternalError(Box::new(std::io::Error::other(format!(
                "{name} column family not found"
            ))))
        })
    }

    fn read_transaction(&self, txn_id: Uuid) -> Result<Option<Transaction>> {
        let cf = self.cf(CF_TRANSACTIONS)?;
        match self.db.get_cf(cf, txn_id.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl TransactionStore for RocksDBStore {
    async fn store(&self, tx: Transaction) -> Result<()> {
        let transactions = self.cf(CF_TRANSACTIONS)?;
        let payments = self.cf(CF_PAYMENTS)?;

        let value = serde_json::to_vec(&tx)?;
        let mut batch = WriteBatch::default();
        batch.put_cf(transactions, tx.txn_id.as_bytes(), value);
        batch.put_cf(payments, tx.payment_id.as_bytes(), tx.txn_id.as_bytes());
        self.db.write(batch)?;

        Ok(())
    }

    async fn get(&self, txn_id: Uuid) -> Result<Option<Transaction>> {
        self.read_transaction(txn_id)
    }

    async fn latest_for_payment(&self, payment_id: Uuid) -> Result<Option<Transaction>> {
        let payments = self.cf(CF_PAYMENTS)?;
        let Some(bytes) = self.db.get_cf(payments, payment_id.as_bytes())? else {
            return Ok(None);
        };
        let txn_id = Uuid::from_slice(&bytes)
            .map_err(|e| GatewayError::StorageError(format!("Corrupt payment index: {e}")))?;
        self.read_transaction(txn_id)
    }
}
