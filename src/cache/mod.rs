//! Cache Module
//!
//! Bounded LRU caching in front of the backing store.

mod lru;
mod lru_cache;
mod stats;


// Re-export public types
pub use lru::{Keys, LruList};
pub use lru_cache::LruCache;
pub use stats::CacheStats;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed value size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB
