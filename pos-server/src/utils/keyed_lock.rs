//! Per-key async mutexes
//!
//! Serializes read-check-write sequences on one key (e.g. one employee's
//! break, one cashier's clock-in for one shift) without a global lock.
//! An entry lives only while someone holds or waits on it.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockMap = DashMap<String, Arc<Mutex<()>>>;

#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: Arc<LockMap>,
}

/// Exclusive access to one key; the entry is removed on drop when idle
#[derive(Debug)]
pub struct KeyedGuard {
    guard: Option<OwnedMutexGuard<()>>,
    key: String,
    locks: Arc<LockMap>,
}

impl Drop for KeyedGuard {
    fn drop(&mut self) {
        // 先释放锁，再看是否还有人在等
        drop(self.guard.take());
        self.locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, key: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn wrap(&self, key: &str, guard: OwnedMutexGuard<()>) -> KeyedGuard {
        KeyedGuard {
            guard: Some(guard),
            key: key.to_string(),
            locks: self.locks.clone(),
        }
    }

    /// Wait for exclusive access to `key`
    pub async fn lock(&self, key: &str) -> KeyedGuard {
        let guard = self.entry(key).lock_owned().await;
        self.wrap(key, guard)
    }

    /// Exclusive access to `key` if nobody holds it
    pub fn try_lock(&self, key: &str) -> Option<KeyedGuard> {
        let guard = self.entry(key).try_lock_owned().ok()?;
        Some(self.wrap(key, guard))
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_key_is_exclusive() {
        let locks = KeyedLocks::new();
        let guard = locks.lock("e1").await;
        assert!(locks.try_lock("e1").is_none());
        assert!(locks.try_lock("e2").is_some());
        drop(guard);
        assert!(locks.try_lock("e1").is_some());
    }

    #[tokio::test]
    async fn test_entries_removed_after_release() {
        let locks = KeyedLocks::new();
        let held = locks.lock("a").await;
        drop(locks.lock("b").await);
        assert_eq!(locks.len(), 1);

        drop(held);
        assert!(locks.is_empty());

        for i in 0..100 {
            let _guard = locks.lock(&format!("k{i}")).await;
        }
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_waiter_keeps_entry_alive() {
        let locks = Arc::new(KeyedLocks::new());
        let held = locks.lock("a").await;

        let waiter = tokio::spawn({
            let locks = locks.clone();
            async move {
                let _guard = locks.lock("a").await;
            }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        // the waiter's handle keeps the entry while the holder lets go
        drop(held);
        waiter.await.unwrap();
        assert!(locks.is_empty());
    }
}
