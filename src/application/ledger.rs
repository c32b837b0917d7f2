use crate::config::LedgerConfig;
use crate::domain::ports::KeyValueStoreRef;
use crate::error::Result;
use std::collections::BTreeSet;
use tracing::warn;
use uuid::Uuid;

fn retry_key(payment_id: Uuid) -> String {
    format!("payment:retry:{payment_id}")
}

fn failed_vendors_key(payment_id: Uuid) -> String {
    format!("payment:failed-vendors:{payment_id}")
}

fn declined_key(payment_id: Uuid) -> String {
    format!("checkout:declined:{payment_id}")
}

/// Per-payment retry state: how often the payment was submitted, which
/// vendors already failed it, and which instruments were declined for it.
///
/// The failed-vendor set only ever grows while its entry lives.
#[derive(Clone)]
pub struct RetryLedger {
    store: KeyValueStoreRef,
    config: LedgerConfig,
}

impl RetryLedger {
    pub fn new(store: KeyValueStoreRef, config: LedgerConfig) -> Self {
        Self { store, config }
    }

    /// Counts one more submission and returns the new total.
    pub async fn record_attempt(&self, payment_id: Uuid) -> Result<u32> {
        let count = self
            .store
            .increment(&retry_key(payment_id), Some(self.config.retry_counter_ttl()))
            .await?;
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    /// Submissions counted so far; zero if none or expired.
    pub async fn attempts(&self, payment_id: Uuid) -> Result<u32> {
        let raw = self.store.get(&retry_key(payment_id)).await?;
        Ok(raw.and_then(|r| r.parse().ok()).unwrap_or(0))
    }

    pub async fn failed_vendors(&self, payment_id: Uuid) -> Result<BTreeSet<String>> {
        self.store.set_members(&failed_vendors_key(payment_id)).await
    }

    pub async fn exclude_vendor(&self, payment_id: Uuid, vendor_id: &str) -> Result<()> {
        self.store
            .set_add(
                &failed_vendors_key(payment_id),
                vendor_id,
                Some(self.config.failed_vendors_ttl()),
            )
            .await?;
        Ok(())
    }

    pub async fn declined_instruments(&self, payment_id: Uuid) -> Result<BTreeSet<Uuid>> {
        let members = self.store.set_members(&declined_key(payment_id)).await?;
        Ok(members
            .into_iter()
            .filter_map(|m| match Uuid::parse_str(&m) {
                Ok(id) => Some(id),
                Err(_) => {
                    warn!(%payment_id, member = %m, "Ignoring malformed declined instrument entry");
                    None
                }
            })
            .collect())
    }

    pub async fn record_declined_instrument(
        &self,
        payment_id: Uuid,
        instrument_id: Uuid,
    ) -> Result<()> {
        self.store
            .set_add(
                &declined_key(payment_id),
                &instrument_id.to_string(),
                Some(self.config.declined_instruments_ttl()),
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::KeyValueStore;
    use crate::infrastructure::in_memory::InMemoryKeyValueStore;
    use std::sync::Arc;

    fn ledger() -> (RetryLedger, Arc<InMemoryKeyValueStore>) {
        let store = Arc::new(InMemoryKeyValueStore::new());
        (RetryLedger::new(store.clone(), LedgerConfig::default()), store)
    }

    #[tokio::test]
    async fn test_attempts_are_counted() {
        let (ledger, _) = ledger();
        let payment_id = Uuid::new_v4();
        assert_eq!(ledger.attempts(payment_id).await.unwrap(), 0);
        assert_eq!(ledger.record_attempt(payment_id).await.unwrap(), 1);
        assert_eq!(ledger.record_attempt(payment_id).await.unwrap(), 2);
        assert_eq!(ledger.attempts(payment_id).await.unwrap(), 2);
        assert_eq!(ledger.attempts(Uuid::new_v4()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failed_vendors_accumulate_per_payment() {
        let (ledger, _) = ledger();
        let payment_id = Uuid::new_v4();
        ledger.exclude_vendor(payment_id, "A").await.unwrap();
        ledger.exclude_vendor(payment_id, "B").await.unwrap();
        ledger.exclude_vendor(payment_id, "A").await.unwrap();

        let failed = ledger.failed_vendors(payment_id).await.unwrap();
        assert_eq!(failed, BTreeSet::from(["A".to_string(), "B".to_string()]));
        assert!(ledger.failed_vendors(Uuid::new_v4()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_declined_instruments_skip_malformed_members() {
        let (ledger, store) = ledger();
        let payment_id = Uuid::new_v4();
        let instrument = Uuid::new_v4();
        ledger
            .record_declined_instrument(payment_id, instrument)
            .await
            .unwrap();
        store
            .set_add(&declined_key(payment_id), "not-a-uuid", None)
            .await
            .unwrap();

        let declined = ledger.declined_instruments(payment_id).await.unwrap();
        assert_eq!(declined, BTreeSet::from([instrument]));
    }
}
