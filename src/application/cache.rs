use crate::config::LedgerConfig;
use crate::domain::checkout::CheckoutResponse;
use crate::domain::ports::KeyValueStoreRef;
use crate::domain::transaction::{PaymentStatusResponse, Transaction};
use crate::error::Result;
use std::time::Duration;
use uuid::Uuid;

/// Write-once cache of checkout responses keyed by idempotency key.
#[derive(Clone)]
pub struct CheckoutCache {
    store: KeyValueStoreRef,
    ttl: Option<Duration>,
}

impl CheckoutCache {
    pub fn new(store: KeyValueStoreRef, ttl: Option<Duration>) -> Self {
        Self { store, ttl }
    }

    fn key(idempotency_key: Uuid) -> String {
        format!("checkout:idempotency:{idempotency_key}")
    }

    pub async fn get(&self, idempotency_key: Uuid) -> Result<Option<CheckoutResponse>> {
        match self.store.get(&Self::key(idempotency_key)).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Stores `response` unless a response is already cached for the key,
    /// and returns whichever response the key now holds.
    pub async fn insert_once(
        &self,
        idempotency_key: Uuid,
        response: CheckoutResponse,
    ) -> Result<CheckoutResponse> {
        let json = serde_json::to_string(&response)?;
        match self
            .store
            .put_if_absent(&Self::key(idempotency_key), json, self.ttl)
            .await?
        {
            Some(existing) => Ok(serde_json::from_str(&existing)?),
            None => Ok(response),
        }
    }
}

/// Fast-path copies of the latest attempt and status per payment id.
///
/// The transaction store stays authoritative; these entries only save a
/// round trip and may be missing at any time.
#[derive(Clone)]
pub struct PaymentCache {
    store: KeyValueStoreRef,
    config: LedgerConfig,
}

impl PaymentCache {
    pub fn new(store: KeyValueStoreRef, config: LedgerConfig) -> Self {
        Self { store, config }
    }

    fn transaction_key(payment_id: Uuid) -> String {
        format!("payment:txn:{payment_id}")
    }

    fn status_key(payment_id: Uuid) -> String {
        format!("payment:status:{payment_id}")
    }

    pub async fn transaction(&self, payment_id: Uuid) -> Result<Option<Transaction>> {
        match self.store.get(&Self::transaction_key(payment_id)).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Caches `txn` unless the entry already holds a later attempt.
    pub async fn put_transaction(&self, txn: &Transaction) -> Result<()> {
        let json = serde_json::to_string(txn)?;
        let created_at = txn.created_at;
        let newer_cached = move |current: &str| {
            serde_json::from_str::<Transaction>(current)
                .is_ok_and(|cached| cached.created_at > created_at)
        };
        self.store
            .update(
                &Self::transaction_key(txn.payment_id),
                Some(self.config.payment_cache_ttl()),
                &move |current: Option<&str>| match current {
                    Some(current) if newer_cached(current) => Some(current.to_string()),
                    _ => Some(json.clone()),
                },
            )
            .await?;
        Ok(())
    }

    pub async fn status(&self, payment_id: Uuid) -> Result<Option<PaymentStatusResponse>> {
        match self.store.get(&Self::status_key(payment_id)).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub async fn put_status(&self, status: &PaymentStatusResponse) -> Result<()> {
        let json = serde_json::to_string(status)?;
        self.store
            .put(
                &Self::status_key(status.payment_id),
                json,
                Some(self.config.status_cache_ttl()),
            )
            .await
    }
}
