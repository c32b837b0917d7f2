use crate::domain::ports::{KeyValueStore, TransactionStore};
use crate::domain::transaction::Transaction;
use crate::error::{GatewayError, Result};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone)]
enum Value {
    Text(String),
    Set(BTreeSet<String>),
    Counter(i64),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: Value, ttl: Option<Duration>) -> Self {
        Self {
            value,
            expires_at: ttl.map(|d| Instant::now() + d),
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

fn wrong_type(key: &str, expected: &str) -> GatewayError {
    GatewayError::StorageError(format!("Key {key} does not hold a {expected}"))
}

/// A thread-safe in-memory key-value store with per-key expiry.
///
/// Every operation takes the write lock for its whole read-modify-write, so
/// concurrent callers never lose updates. Expired entries are dropped lazily
/// on access.
#[derive(Default, Clone)]
pub struct InMemoryKeyValueStore {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl InMemoryKeyValueStore {
    /// Creates a new, empty in-memory key-value store.
    pub fn new() -> Self {
        Self::default()
    }

    fn live<'a>(entries: &'a mut HashMap<String, Entry>, key: &str) -> Option<&'a mut Entry> {
        let now = Instant::now();
        if entries.get(key).is_some_and(|e| e.is_expired(now)) {
            entries.remove(key);
        }
        entries.get_mut(key)
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().await;
        let now = Instant::now();
        match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => match &entry.value {
                Value::Text(text) => Ok(Some(text.clone())),
                Value::Counter(n) => Ok(Some(n.to_string())),
                Value::Set(_) => Err(wrong_type(key, "string")),
            },
            _ => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), Entry::new(Value::Text(value), ttl));
        Ok(())
    }

    async fn put_if_absent(
        &self,
        key: &str,
        value: String,
        ttl: Option<Duration>,
    ) -> Result<Option<String>> {
        let mut entries = self.entries.write().await;
        if let Some(existing) = Self::live(&mut entries, key) {
            return match &existing.value {
                Value::Text(text) => Ok(Some(text.clone())),
                _ => Err(wrong_type(key, "string")),
            };
        }
        entries.insert(key.to_string(), Entry::new(Value::Text(value), ttl));
        Ok(None)
    }

    async fn update(
        &self,
        key: &str,
        ttl: Option<Duration>,
        f: &(dyn for<'a> Fn(Option<&'a str>) -> Option<String> + Send + Sync),
    ) -> Result<Option<String>> {
        let mut entries = self.entries.write().await;
        let current = match Self::live(&mut entries, key) {
            Some(Entry {
                value: Value::Text(text),
                ..
            }) => Some(text.clone()),
            Some(Entry {
                value: Value::Counter(n),
                ..
            }) => Some(n.to_string()),
            Some(_) => return Err(wrong_type(key, "string")),
            None => None,
        };
        let next = f(current.as_deref());
        match &next {
            Some(value) => {
                entries.insert(key.to_string(), Entry::new(Value::Text(value.clone()), ttl));
            }
            None => {
                entries.remove(key);
            }
        }
        Ok(next)
    }

    async fn set_add(&self, key: &str, member: &str, ttl: Option<Duration>) -> Result<bool> {
        let mut entries = self.entries.write().await;
        let added = match Self::live(&mut entries, key) {
            Some(Entry {
                value: Value::Set(members),
                ..
            }) => members.insert(member.to_string()),
            Some(_) => return Err(wrong_type(key, "set")),
            None => {
                let members = BTreeSet::from([member.to_string()]);
                entries.insert(key.to_string(), Entry::new(Value::Set(members), None));
                true
            }
        };
        if let Some(entry) = entries.get_mut(key) {
            entry.expires_at = ttl.map(|d| Instant::now() + d);
        }
        Ok(added)
    }

    async fn set_members(&self, key: &str) -> Result<BTreeSet<String>> {
        let entries = self.entries.read().await;
        let now = Instant::now();
        match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => match &entry.value {
                Value::Set(members) => Ok(members.clone()),
                _ => Err(wrong_type(key, "set")),
            },
            _ => Ok(BTreeSet::new()),
        }
    }

    async fn increment(&self, key: &str, ttl: Option<Duration>) -> Result<i64> {
        let mut entries = self.entries.write().await;
        let current = match Self::live(&mut entries, key) {
            Some(Entry {
                value: Value::Counter(n),
                ..
            }) => *n,
            Some(Entry {
                value: Value::Text(text),
                ..
            }) => text.parse().map_err(|_| wrong_type(key, "counter"))?,
            Some(_) => return Err(wrong_type(key, "counter")),
            None => 0,
        };
        let next = current + 1;
        entries.insert(key.to_string(), Entry::new(Value::Counter(next), ttl));
        Ok(next)
    }
}

#[derive(Default)]
struct TransactionTables {
    by_id: HashMap<Uuid, Transaction>,
    latest_by_payment: HashMap<Uuid, Uuid>,
}

/// A thread-safe in-memory store for payment attempts.
///
/// Keeps every attempt by transaction id plus an index from payment id to
/// the attempt stored most recently.
#[derive(Default, Clone)]
pub struct InMemoryTransactionStore {
    tables: Arc<RwLock<TransactionTables>>,
}

impl InMemoryTransactionStore {
    /// Creates a new, empty in-memory transaction store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of attempts stored, across all payments.
    pub async fn len(&self) -> usize {
        self.tables.read().await.by_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn store(&self, tx: Transaction) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.latest_by_payment.insert(tx.payment_id, tx.txn_id);
        tables.by_id.insert(tx.txn_id, tx);
        Ok(())
    }

    async fn get(&self, txn_id: Uuid) -> Result<Option<Transaction>> {
        let tables = self.tables.read().await;
        Ok(tables.by_id.get(&txn_id).cloned())
    }

    async fn latest_for_payment(&self, payment_id: Uuid) -> Result<Option<Transaction>> {
        let tables = self.tables.read().await;
        Ok(tables
            .latest_by_payment
            .get(&payment_id)
            .and_then(|txn_id| tables.by_id.get(txn_id))
            .cloned())
    }
}
