//! Store Module
//!
//! The authoritative key-value mapping that sits underneath the LRU cache.
//! Entries evicted from the cache stay here.

mod memory;

pub use memory::MemoryStore;

use crate::error::Result;

// == Store Trait ==
/// A thread-safe mapping from string keys to values of type `V`.
pub trait Store<V>: Send + Sync {
    /// Inserts or overwrites the value for `key`.
    fn put(&self, key: &str, value: V) -> Result<()>;

    /// Returns the value for `key`, or `KvError::NotFound`.
    fn get(&self, key: &str) -> Result<V>;

    /// Removes `key`. Deleting an absent key is not an error.
    fn delete(&self, key: &str) -> Result<()>;

    /// Number of keys held.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
