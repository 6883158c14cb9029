//! Cache Statistics Module
//!
//! Tracks hits, misses, store fills and evictions of the LRU cache.

use serde::Serialize;

// == Cache Stats ==
/// Counters describing how the cache has been serving requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Reads served straight from the cache
    pub hits: u64,
    /// Reads that had to consult the backing store
    pub misses: u64,
    /// Misses the backing store could answer, warming the cache
    pub fills: u64,
    /// Entries dropped from the cache to make room (still held by the store)
    pub evictions: u64,
    /// Current number of entries in the cache
    pub entries: usize,
    /// Configured capacity
    pub capacity: usize,
}

impl CacheStats {
    /// Creates zeroed stats for a cache of the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 before any read.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_fill(&mut self) {
        self.fills += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = CacheStats::new(10);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.fills, 0);
        assert_eq!(stats.evictions, 0);
        assert_eq!(stats.capacity, 10);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(CacheStats::new(1).hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = CacheStats::new(1);
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_fills_do_not_count_as_hits() {
        let mut stats = CacheStats::new(1);
        stats.record_miss();
        stats.record_fill();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.hit_rate(), 0.0);
    }
}
