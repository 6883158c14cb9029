//! LRU Cache Module
//!
//! Bounded write-through cache over a backing [`Store`]. Reads populate the
//! cache on miss; writes go to both the store and the cache.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::cache::{CacheStats, LruList};
use crate::error::{KvError, Result};
use crate::store::Store;

// == Cache State ==
/// Everything guarded by the cache lock.
///
/// Every key in `index` maps to exactly one live node in `order`.
#[derive(Debug)]
struct CacheState<V> {
    index: HashMap<String, usize>,
    order: LruList<V>,
    stats: CacheStats,
}

impl<V> CacheState<V> {
    /// Inserts a key known to be absent, evicting the tail first when full.
    fn insert_new(&mut self, capacity: usize, key: &str, value: V) -> Result<()> {
        if self.index.len() >= capacity {
            let (evicted, _) = self.order.pop_back().ok_or_else(|| {
                KvError::InvalidState("least recently used entry is missing".to_string())
            })?;
            if self.index.remove(&evicted).is_none() {
                return Err(KvError::InvalidState(format!(
                    "evicted key '{}' was not indexed",
                    evicted
                )));
            }
            self.stats.record_eviction();
            debug!(key = %evicted, "evicted from cache");
        }

        let idx = self.order.push_front(key.to_string(), value);
        self.index.insert(key.to_string(), idx);
        Ok(())
    }
}

// == LRU Cache ==
/// Write-through, read-populate LRU cache.
///
/// All operations are serialized by one exclusive lock. Eviction only drops
/// the cache's copy; the store keeps the value.
pub struct LruCache<V, S> {
    state: Mutex<CacheState<V>>,
    store: Arc<S>,
    capacity: usize,
}

impl<V, S> LruCache<V, S>
where
    V: Clone,
    S: Store<V>,
{
    // == Constructor ==
    /// Creates a cache holding at most `capacity` entries in front of `store`.
    ///
    /// Fails with `CapacityInvalid` when `capacity` is zero.
    pub fn new(capacity: usize, store: Arc<S>) -> Result<Self> {
        if capacity == 0 {
            return Err(KvError::CapacityInvalid(capacity));
        }

        Ok(Self {
            state: Mutex::new(CacheState {
                index: HashMap::with_capacity(capacity),
                order: LruList::with_capacity(capacity),
                stats: CacheStats::new(capacity),
            }),
            store,
            capacity,
        })
    }

    // == Put ==
    /// Stores `value` under `key` in the store and the cache.
    ///
    /// An existing entry is overwritten in place and becomes most recently
    /// used. A new entry may evict the least recently used one. If the store
    /// rejects the write the cache is left untouched.
    pub fn put(&self, key: &str, value: V) -> Result<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        self.store.put(key, value.clone())?;

        match state.index.get(key) {
            Some(&idx) => {
                let slot = state.order.get_mut(idx).ok_or_else(|| {
                    KvError::InvalidState(format!("indexed key '{}' has no node", key))
                })?;
                *slot = value;
                state.order.move_to_front(idx);
                Ok(())
            }
            None => state.insert_new(self.capacity, key, value),
        }
    }

    // == Get ==
    /// Returns the value for `key`, warming the cache from the store on a miss.
    ///
    /// Fails with `NotFound` when neither the cache nor the store hold the key.
    pub fn get(&self, key: &str) -> Result<V> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        if let Some(&idx) = state.index.get(key) {
            let value = state.order.get(idx).cloned().ok_or_else(|| {
                KvError::InvalidState(format!("indexed key '{}' has no node", key))
            })?;
            state.order.move_to_front(idx);
            state.stats.record_hit();
            return Ok(value);
        }

        state.stats.record_miss();
        let value = self.store.get(key)?;
        state.insert_new(self.capacity, key, value.clone())?;
        state.stats.record_fill();
        Ok(value)
    }

    // == Delete ==
    /// Drops `key` from the cache if present and always deletes it from the store.
    pub fn delete(&self, key: &str) -> Result<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        if let Some(idx) = state.index.remove(key) {
            state.order.remove(idx);
        }

        self.store.delete(key)
    }

    // == Size ==
    /// Returns the number of entries held by the cache (not the store).
    pub fn size(&self) -> usize {
        self.state.lock().index.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // == Contains ==
    /// Checks whether the cache holds `key` without changing recency.
    pub fn contains(&self, key: &str) -> bool {
        self.state.lock().index.contains_key(key)
    }

    // == Keys By Recency ==
    /// Snapshot of cached keys, most recently used first.
    pub fn keys_by_recency(&self) -> Vec<String> {
        self.state.lock().order.keys().map(str::to_string).collect()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        let mut stats = state.stats.clone();
        stats.entries = state.index.len();
        stats
    }

    /// The backing store shared with this cache.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}
