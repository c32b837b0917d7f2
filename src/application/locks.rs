use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One async mutex per key, created on demand and dropped once nobody holds
/// or waits for it.
pub struct KeyedLocks<K> {
    locks: Mutex<HashMap<K, Slot>>,
}

struct Slot {
    mutex: Arc<AsyncMutex<()>>,
    /// Holders plus waiters, including ones whose wait was cancelled but
    /// not yet unwound.
    users: usize,
}

impl<K: Eq + Hash + Clone> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other holder of `key` remains.
    pub async fn lock(&self, key: K) -> KeyedGuard<'_, K> {
        let (lease, mutex) = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            let slot = locks.entry(key.clone()).or_insert_with(|| Slot {
                mutex: Arc::default(),
                users: 0,
            });
            slot.users += 1;
            let lease = Lease { owner: self, key };
            (lease, slot.mutex.clone())
        };
        // Dropping this future mid-wait still drops `lease`.
        let guard = mutex.lock_owned().await;
        KeyedGuard {
            _guard: guard,
            _lease: lease,
        }
    }

    #[cfg(test)]
    fn active(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Registration of one holder or waiter; the last one out removes the slot.
struct Lease<'a, K: Eq + Hash + Clone> {
    owner: &'a KeyedLocks<K>,
    key: K,
}

impl<K: Eq + Hash + Clone> Drop for Lease<'_, K> {
    fn drop(&mut self) {
        let mut locks = self
            .owner
            .locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = locks.get_mut(&self.key) {
            slot.users -= 1;
            if slot.users == 0 {
                locks.remove(&self.key);
            }
        }
    }
}

/// Held lock for one key. Fields drop in order: the mutex is released
/// before the lease.
pub struct KeyedGuard<'a, K: Eq + Hash + Clone> {
    _guard: OwnedMutexGuard<()>,
    _lease: Lease<'a, K>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_key_is_serialized() {
        let locks = Arc::new(KeyedLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..10 {
            let locks = locks.clone();
            let inside = inside.clone();
            let max_inside = max_inside.clone();
            handles.push(tokio::spawn(async move {
                let _guard = locks.lock("payment").await;
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_inside.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert_eq!(locks.active(), 0);
    }

    #[tokio::test]
    async fn test_different_keys_do_not_block() {
        let locks = KeyedLocks::new();
        let _a = locks.lock(1).await;
        let b = tokio::time::timeout(Duration::from_millis(50), locks.lock(2)).await;
        assert!(b.is_ok());
        assert_eq!(locks.active(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_wait_releases_key() {
        let locks = KeyedLocks::new();
        let held = locks.lock("payment").await;

        let mut waiter = Box::pin(locks.lock("payment"));
        let waited = tokio::time::timeout(Duration::from_millis(10), &mut waiter).await;
        assert!(waited.is_err());
        assert_eq!(locks.active(), 1);

        drop(held);
        drop(waiter);
        assert_eq!(locks.active(), 0);
    }

    #[tokio::test]
    async fn test_key_is_reusable_after_cancelled_wait() {
        let locks = KeyedLocks::new();
        let held = locks.lock(7).await;
        let waited = tokio::time::timeout(Duration::from_millis(10), locks.lock(7)).await;
        assert!(waited.is_err());
        drop(held);

        let again = tokio::time::timeout(Duration::from_millis(50), locks.lock(7)).await;
        assert!(again.is_ok());
    }
}
