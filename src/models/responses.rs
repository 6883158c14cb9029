//! Response DTOs for the key-value server API
//!
//! Values travel as raw bodies; only the operational endpoints answer JSON.

use serde::Serialize;

use crate::cache::CacheStats;

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Misses answered by the backing store
    pub fills: u64,
    /// Number of evictions
    pub evictions: u64,
    /// Current number of entries in cache
    pub cache_entries: usize,
    /// Configured cache capacity
    pub capacity: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Sequence number of the last logged mutation
    pub last_sequence: u64,
}

impl StatsResponse {
    pub fn new(stats: &CacheStats, last_sequence: u64) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            fills: stats.fills,
            evictions: stats.evictions,
            cache_entries: stats.entries,
            capacity: stats.capacity,
            hit_rate: stats.hit_rate(),
            last_sequence,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// "healthy", or "degraded" once the transaction log has failed
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    /// Failure reported by the log writer, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_error: Option<String>,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            log_error: None,
        }
    }

    pub fn degraded(log_error: impl Into<String>) -> Self {
        Self {
            status: "degraded".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            log_error: Some(log_error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_response_from_stats() {
        let mut stats = CacheStats::new(10);
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        stats.entries = 4;

        let resp = StatsResponse::new(&stats, 42);
        assert!((resp.hit_rate - 0.75).abs() < 0.001);
        assert_eq!(resp.cache_entries, 4);
        assert_eq!(resp.capacity, 10);
        assert_eq!(resp.last_sequence, 42);
    }

    #[test]
    fn test_health_response_serialize() {
        let json = serde_json::to_string(&HealthResponse::healthy()).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
        assert!(!json.contains("log_error"));
    }

    #[test]
    fn test_degraded_response_serialize() {
        let json = serde_json::to_string(&HealthResponse::degraded("disk full")).unwrap();
        assert!(json.contains("degraded"));
        assert!(json.contains("disk full"));
    }
}
