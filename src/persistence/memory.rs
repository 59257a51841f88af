//! In-Memory Backing Store
//!
//! A `HashMap`-backed implementation of the backing-store port. Used in
//! tests and by embedders that want the replay pipeline without real
//! storage. Supports failure injection to exercise replay retry semantics.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{CacheError, Result};
use crate::persistence::BackingStore;

// == In-Memory Backing Store ==
#[derive(Debug, Default)]
pub struct InMemoryBackingStore {
    entries: Mutex<HashMap<String, String>>,
    /// Number of persist calls that should fail before writes succeed again
    fail_next: AtomicU64,
}

impl InMemoryBackingStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` persist calls fail with a recoverable error.
    pub fn fail_next(&self, count: u64) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    /// Returns the value persisted for `key`, if any.
    pub fn value_of(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    /// Number of persisted pairs.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if nothing has been persisted.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[async_trait]
impl BackingStore for InMemoryBackingStore {
    async fn persist(&self, key: &str, value: &str) -> Result<()> {
        let remaining = self.fail_next.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_next.store(remaining - 1, Ordering::SeqCst);
            return Err(CacheError::ReplayPersist(format!(
                "injected failure persisting '{}'",
                key
            )));
        }
        self.entries
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<(String, String)>> {
        Ok(self
            .entries
            .lock()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_persist_and_load_all() {
        let store = InMemoryBackingStore::new();

        store.persist("a", "1").await.unwrap();
        store.persist("b", "2").await.unwrap();

        let mut all = store.load_all().await.unwrap();
        all.sort();
        assert_eq!(
            all,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_persist_last_write_wins() {
        let store = InMemoryBackingStore::new();

        store.persist("a", "old").await.unwrap();
        store.persist("a", "new").await.unwrap();

        assert_eq!(store.value_of("a"), Some("new".to_string()));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let store = InMemoryBackingStore::new();
        store.fail_next(1);

        let result = store.persist("a", "1").await;
        assert!(matches!(result, Err(CacheError::ReplayPersist(_))));

        // Recovers after the injected failure
        store.persist("a", "1").await.unwrap();
        assert_eq!(store.value_of("a"), Some("1".to_string()));
    }
}
