use super::catalog::{Instrument, MerchantPaymentConfig, PaymentMethod};
use super::money::Amount;
use super::transaction::{PaymentRequest, Transaction, VendorOutcome};
use super::vendor::VendorHealth;
use crate::error::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Durable record of every payment attempt.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn store(&self, tx: Transaction) -> Result<()>;
    async fn get(&self, txn_id: Uuid) -> Result<Option<Transaction>>;
    /// The most recently stored attempt for a payment id.
    async fn latest_for_payment(&self, payment_id: Uuid) -> Result<Option<Transaction>>;
}

/// Shared key-value store with per-key expiry.
///
/// Every method is atomic for its key. Counters and sets live in the same
/// keyspace as plain values; `get` on a counter returns its decimal text.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn put(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<()>;
    /// Stores `value` only if the key is vacant. Returns the value that was
    /// already there, or `None` if this call wrote it.
    async fn put_if_absent(
        &self,
        key: &str,
        value: String,
        ttl: Option<Duration>,
    ) -> Result<Option<String>>;
    /// Replaces the value at `key` with `f(current)` as one atomic step;
    /// `None` from `f` removes the key. Returns what `f` produced.
    async fn update(
        &self,
        key: &str,
        ttl: Option<Duration>,
        f: &(dyn for<'a> Fn(Option<&'a str>) -> Option<String> + Send + Sync),
    ) -> Result<Option<String>>;
    /// Adds a member to the set at `key` and refreshes its expiry. Returns
    /// `true` if the member was new.
    async fn set_add(&self, key: &str, member: &str, ttl: Option<Duration>) -> Result<bool>;
    async fn set_members(&self, key: &str) -> Result<BTreeSet<String>>;
    /// Increments the counter at `key`, creating it at zero, and refreshes
    /// its expiry. Returns the new value.
    async fn increment(&self, key: &str, ttl: Option<Duration>) -> Result<i64>;
}

#[async_trait]
pub trait PaymentMethodCatalog: Send + Sync {
    async fn active_methods(&self) -> Result<Vec<PaymentMethod>>;
}

#[async_trait]
pub trait InstrumentDirectory: Send + Sync {
    async fn instruments_for_user(&self, user_id: Uuid) -> Result<Vec<Instrument>>;
}

#[async_trait]
pub trait MerchantConfigSource: Send + Sync {
    async fn config(
        &self,
        merchant_id: Uuid,
        method_id: &str,
    ) -> Result<Option<MerchantPaymentConfig>>;
}

#[async_trait]
pub trait DowntimeSignal: Send + Sync {
    async fn is_instrument_down(&self, method_id: &str, issuer: Option<&str>) -> Result<bool>;
}

#[async_trait]
pub trait VendorDirectory: Send + Sync {
    async fn available_vendors(&self) -> Result<Vec<VendorHealth>>;
}

#[async_trait]
pub trait PricingSource: Send + Sync {
    /// Fee for routing `amount` through `vendor_id`, or `None` when no
    /// pricing model applies.
    async fn fee(&self, vendor_id: &str, amount: Amount) -> Result<Option<Decimal>>;
}

/// Executes a payment against a settlement vendor.
///
/// Implementations bound their own latency and report a timeout as
/// `FailureType::Timeout` rather than hanging.
#[async_trait]
pub trait VendorGateway: Send + Sync {
    async fn execute(&self, vendor_id: &str, request: &PaymentRequest) -> Result<VendorOutcome>;
}

pub type TransactionStoreRef = Arc<dyn TransactionStore>;
pub type KeyValueStoreRef = Arc<dyn KeyValueStore>;
pub type PaymentMethodCatalogRef = Arc<dyn PaymentMethodCatalog>;
pub type InstrumentDirectoryRef = Arc<dyn InstrumentDirectory>;
pub type MerchantConfigSourceRef = Arc<dyn MerchantConfigSource>;
pub type DowntimeSignalRef = Arc<dyn DowntimeSignal>;
pub type VendorDirectoryRef = Arc<dyn VendorDirectory>;
pub type PricingSourceRef = Arc<dyn PricingSource>;
pub type VendorGatewayRef = Arc<dyn VendorGateway>;
