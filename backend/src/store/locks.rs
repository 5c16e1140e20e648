//! In-process serialization of read-modify-write sequences per record key

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;

use super::backend::Collection;

/// Held for the duration of one mutation on a record
pub type KeyGuard = OwnedMutexGuard<()>;

#[derive(Default)]
pub struct KeyedLocks {
    slots: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `(collection, key)`
    pub async fn lock(&self, collection: Collection, key: &str) -> KeyGuard {
        let slot = {
            let mut slots = self
                .slots
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            // Nobody holds or waits on an entry whose only owner is the map
            slots.retain(|_, slot| Arc::strong_count(slot) > 1);
            slots
                .entry(format!("{}/{}", collection.name(), key))
                .or_default()
                .clone()
        };
        slot.lock_owned().await
    }

    /// Number of keys currently held or awaited
    pub fn active(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .values()
            .filter(|slot| Arc::strong_count(slot) > 1)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_key_is_exclusive() {
        let locks = Arc::new(KeyedLocks::new());
        let guard = locks.lock(Collection::Inventory, "Мак_kg").await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.lock(Collection::Inventory, "Мак_kg").await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
        assert_eq!(locks.active(), 0);
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_block() {
        let locks = KeyedLocks::new();
        let _a = locks.lock(Collection::UnloadingDrafts, "Садова").await;
        let _b = locks.lock(Collection::PurchaseDrafts, "Садова").await;
        assert_eq!(locks.active(), 2);
    }
}
