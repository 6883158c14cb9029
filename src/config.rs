//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the LRU cache can hold
    pub cache_capacity: usize,
    /// Path of the append-only transaction log file
    pub log_path: PathBuf,
    /// Capacity of the bounded channel feeding the log writer
    pub log_buffer: usize,
    /// HTTP server port
    pub server_port: u16,
    /// Per-client throttle, disabled when None
    pub throttle: Option<ThrottleConfig>,
}

/// Token bucket parameters for the request throttle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleConfig {
    /// Bucket size
    pub max: u32,
    /// Tokens added per elapsed interval
    pub refill: u32,
    /// Refill interval
    pub interval: Duration,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Maximum cache entries (default: 25)
    /// - `TRANSACTION_LOG` - Transaction log path (default: transaction.log)
    /// - `LOG_BUFFER` - Log writer queue size (default: 16)
    /// - `SERVER_PORT` - HTTP server port (default: 8080)
    /// - `THROTTLE_MAX` - Enables the throttle with this bucket size
    /// - `THROTTLE_REFILL` - Tokens per refill interval (default: 1)
    /// - `THROTTLE_INTERVAL_MS` - Refill interval in milliseconds (default: 1000)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let throttle = env_parse::<u32>("THROTTLE_MAX").map(|max| ThrottleConfig {
            max,
            refill: env_parse("THROTTLE_REFILL").unwrap_or(1),
            interval: Duration::from_millis(env_parse("THROTTLE_INTERVAL_MS").unwrap_or(1000)),
        });

        Self {
            cache_capacity: env_parse("CACHE_CAPACITY").unwrap_or(defaults.cache_capacity),
            log_path: env::var("TRANSACTION_LOG")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_path),
            log_buffer: env_parse("LOG_BUFFER").unwrap_or(defaults.log_buffer),
            server_port: env_parse("SERVER_PORT").unwrap_or(defaults.server_port),
            throttle,
        }
    }
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_capacity: 25,
            log_path: PathBuf::from("transaction.log"),
            log_buffer: 16,
            server_port: 8080,
            throttle: None,
        }
    }
}
