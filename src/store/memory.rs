//! In-Memory Store
//!
//! HashMap storage guarded by a single reader/writer lock.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::{KvError, Result};
use crate::store::Store;

// == Memory Store ==
/// Backing store holding every accepted key for the lifetime of the process.
///
/// Reads take the shared lock and may run concurrently; writes are exclusive.
#[derive(Debug, Default)]
pub struct MemoryStore<V> {
    entries: RwLock<HashMap<String, V>>,
}

impl<V> MemoryStore<V> {
    // == Constructor ==
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<V: Clone + Send + Sync> Store<V> for MemoryStore<V> {
    fn put(&self, key: &str, value: V) -> Result<()> {
        self.entries.write().insert(key.to_string(), value);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<V> {
        self.entries
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| KvError::NotFound(key.to_string()))
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.entries.write().remove(key);
        Ok(())
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_store_put_and_get() {
        let store = MemoryStore::new();
        store.put("key", "value".to_string()).unwrap();

        assert_eq!(store.get("key").unwrap(), "value");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_put_overwrites() {
        let store = MemoryStore::new();
        store.put("key", 1u32).unwrap();
        store.put("key", 2u32).unwrap();

        assert_eq!(store.get("key").unwrap(), 2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_get_missing() {
        let store: MemoryStore<String> = MemoryStore::new();
        assert!(matches!(store.get("test_key"), Err(KvError::NotFound(k)) if k == "test_key"));
    }

    #[test]
    fn test_store_delete() {
        let store = MemoryStore::new();
        store.put("key", String::new()).unwrap();
        store.delete("key").unwrap();

        assert!(store.is_empty());
        assert!(store.get("key").is_err());
    }

    #[test]
    fn test_store_delete_missing_is_ok() {
        let store: MemoryStore<String> = MemoryStore::new();
        assert!(store.delete("nonexistent").is_ok());
    }

    #[test]
    fn test_store_concurrent_writers() {
        let store = Arc::new(MemoryStore::new());

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for i in 0..100 {
                        store.put(&format!("{}-{}", t, i), i).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 800);
        assert_eq!(store.get("7-99").unwrap(), 99);
    }
}
