//! Service Facade
//!
//! Composes the LRU cache, its backing store and the transaction log behind
//! the Put/Get/Delete contract used by the HTTP layer.
//!
//! Mutations are applied to the cache (and through it the store) first and
//! appended to the log second, one mutation at a time, so the log records
//! them in the order the store saw them. A failed append is not rolled back:
//! the caller receives `LogUnavailable` and the service turns read-only.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{watch, Mutex};
use tracing::{info, warn};

use crate::cache::{CacheStats, LruCache, MAX_KEY_LENGTH, MAX_VALUE_SIZE};
use crate::config::Config;
use crate::error::{KvError, Result};
use crate::store::{MemoryStore, Store};
use crate::wal::{EventType, LogFailure, TransactionLog, TransactionLogWriter};

/// Cache configuration used by the server.
pub type KvCache = LruCache<Bytes, MemoryStore<Bytes>>;

// == Replay ==
/// Applies every event of `log` to `cache` in sequence order.
///
/// Returns the number of events applied. Any error aborts the replay.
pub fn replay<S: Store<Bytes>>(log: &mut TransactionLog, cache: &LruCache<Bytes, S>) -> Result<u64> {
    replay_after(log, cache, 0)
}

/// Like [`replay`], applying only events with a sequence above `after`.
pub fn replay_after<S: Store<Bytes>>(
    log: &mut TransactionLog,
    cache: &LruCache<Bytes, S>,
    after: u64,
) -> Result<u64> {
    let mut applied = 0;
    for event in log.read_events_after(after)? {
        let event = event?;
        match event.event_type {
            EventType::Put => cache.put(&event.key, event.value)?,
            EventType::Delete => cache.delete(&event.key)?,
        }
        applied += 1;
    }
    Ok(applied)
}

// == Validation ==
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(KvError::InvalidRequest("Key cannot be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(KvError::InvalidRequest(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    Ok(())
}

fn validate_value(value: &[u8]) -> Result<()> {
    if value.len() > MAX_VALUE_SIZE {
        return Err(KvError::InvalidRequest(format!(
            "Value exceeds maximum size of {} bytes",
            MAX_VALUE_SIZE
        )));
    }
    Ok(())
}

// == Kv Service ==
/// The key-value service: cache over store, mirrored into the log.
pub struct KvService {
    cache: Arc<KvCache>,
    log: TransactionLogWriter,
    /// Held from the writable check until the event is enqueued
    write_order: Mutex<()>,
}

impl KvService {
    // == Open ==
    /// Builds the store and cache, replays the log at `config.log_path` into
    /// them and starts the log writer.
    ///
    /// Any replay error is returned and the service is not started. Must be
    /// called from within a Tokio runtime.
    pub fn open(config: &Config) -> Result<Self> {
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(LruCache::new(config.cache_capacity, store)?);

        let mut log = TransactionLog::open(&config.log_path)?;
        let applied = replay(&mut log, &*cache)?;
        info!(
            path = %log.path().display(),
            events = applied,
            last_sequence = log.last_sequence(),
            "transaction log replayed"
        );

        let writer = log.run(config.log_buffer)?;
        Ok(Self::new(cache, writer))
    }

    /// Assembles a service from an already replayed cache and a running writer.
    pub fn new(cache: Arc<KvCache>, log: TransactionLogWriter) -> Self {
        Self {
            cache,
            log,
            write_order: Mutex::new(()),
        }
    }

    // == Put ==
    pub async fn put(&self, key: &str, value: Bytes) -> Result<()> {
        validate_key(key)?;
        validate_value(&value)?;

        let _order = self.write_order.lock().await;
        self.ensure_writable()?;

        self.cache.put(key, value.clone())?;
        self.log.write_put(key, value).await.inspect_err(|err| {
            warn!(key, error = %err, "put applied but not logged");
        })
    }

    // == Get ==
    pub fn get(&self, key: &str) -> Result<Bytes> {
        validate_key(key)?;
        self.cache.get(key)
    }

    // == Delete ==
    pub async fn delete(&self, key: &str) -> Result<()> {
        validate_key(key)?;

        let _order = self.write_order.lock().await;
        self.ensure_writable()?;

        self.cache.delete(key)?;
        self.log.write_delete(key).await.inspect_err(|err| {
            warn!(key, error = %err, "delete applied but not logged");
        })
    }

    /// Rejects mutations once the log writer has failed.
    fn ensure_writable(&self) -> Result<()> {
        match self.log.failure() {
            Some(failure) => Err(KvError::LogUnavailable(failure.to_string())),
            None => Ok(()),
        }
    }

    // == Introspection ==
    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn last_sequence(&self) -> u64 {
        self.log.last_sequence()
    }

    /// True once the log writer has failed; the service is read-only from then on.
    pub fn is_degraded(&self) -> bool {
        self.log.failure().is_some()
    }

    pub fn log_failure(&self) -> LogFailure {
        self.log.failure()
    }

    /// Subscribes to log writer failures.
    pub fn log_errors(&self) -> watch::Receiver<LogFailure> {
        self.log.err()
    }

    pub fn cache(&self) -> &Arc<KvCache> {
        &self.cache
    }

    // == Shutdown ==
    /// Flushes and closes the log. Later mutations fail with `LogUnavailable`.
    pub async fn shutdown(&self) -> Result<u64> {
        self.log.close().await
    }
}
