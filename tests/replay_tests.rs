//! Integration Tests for Cache, Store and Transaction Log
//!
//! End-to-end scenarios across the cache, its backing store and replay.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Barrier};
use std::thread;

use bytes::Bytes;
use mini_kv::cache::LruCache;
use mini_kv::service::{replay, replay_after};
use mini_kv::store::{MemoryStore, Store};
use mini_kv::wal::{EventType, TransactionLog};
use mini_kv::{Config, KvError, KvService};
use parking_lot::Mutex;
use proptest::prelude::*;

type Cache = LruCache<Bytes, MemoryStore<Bytes>>;

fn new_cache(capacity: usize) -> (Cache, Arc<MemoryStore<Bytes>>) {
    let store = Arc::new(MemoryStore::new());
    let cache = LruCache::new(capacity, Arc::clone(&store)).unwrap();
    (cache, store)
}

/// Keys used by the generated operations.
const OP_KEYS: [&str; 5] = ["a", "b", "c", "d", "e"];

fn snapshot(store: &MemoryStore<Bytes>) -> BTreeMap<String, Bytes> {
    OP_KEYS
        .iter()
        .filter_map(|key| store.get(key).ok().map(|value| (key.to_string(), value)))
        .collect()
}

/// Store that remembers the order in which puts reached it.
///
/// The cache writes to its store while holding its own lock, so this is
/// also the order in which cache puts completed.
#[derive(Default)]
struct RecordingStore {
    inner: MemoryStore<Bytes>,
    puts: Mutex<Vec<String>>,
}

impl Store<Bytes> for RecordingStore {
    fn put(&self, key: &str, value: Bytes) -> mini_kv::Result<()> {
        self.puts.lock().push(key.to_string());
        self.inner.put(key, value)
    }

    fn get(&self, key: &str) -> mini_kv::Result<Bytes> {
        self.inner.get(key)
    }

    fn delete(&self, key: &str) -> mini_kv::Result<()> {
        self.inner.delete(key)
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}

// == Cache Scenarios ==

#[test]
fn test_eviction_leaves_store_intact() {
    let (cache, store) = new_cache(1);

    cache.put("k1", Bytes::from_static(b"v1")).unwrap();
    cache.put("k2", Bytes::from_static(b"v2")).unwrap();

    assert_eq!(cache.keys_by_recency(), vec!["k2"]);
    assert_eq!(store.get("k1").unwrap(), Bytes::from_static(b"v1"));
    assert_eq!(store.get("k2").unwrap(), Bytes::from_static(b"v2"));
}

#[test]
fn test_get_on_empty_cache_is_not_found() {
    let (cache, _) = new_cache(1);
    assert!(matches!(cache.get("missing"), Err(KvError::NotFound(_))));
}

#[test]
fn test_delete_reaches_store() {
    let (cache, store) = new_cache(4);

    cache.put("a", Bytes::from_static(b"1")).unwrap();
    cache.delete("a").unwrap();

    assert!(matches!(cache.get("a"), Err(KvError::NotFound(_))));
    assert!(matches!(store.get("a"), Err(KvError::NotFound(_))));
}

#[test]
fn test_concurrent_puts_follow_completion_order() {
    for _ in 0..50 {
        let store = Arc::new(RecordingStore::default());
        let cache = Arc::new(LruCache::new(2, Arc::clone(&store)).unwrap());
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = ["left", "right"]
            .into_iter()
            .map(|key| {
                let cache = Arc::clone(&cache);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    cache.put(key, Bytes::from(key)).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let completed = store.puts.lock().clone();
        assert_eq!(completed.len(), 2);

        // The put that completed last is the most recently used
        let order = cache.keys_by_recency();
        assert_eq!(order, vec![completed[1].clone(), completed[0].clone()]);
        assert_eq!(store.len(), 2);

        assert_eq!(cache.get("left").unwrap(), Bytes::from_static(b"left"));
        assert_eq!(cache.get("right").unwrap(), Bytes::from_static(b"right"));
    }
}

// == Replay Scenarios ==

#[test]
fn test_replay_stops_at_sequence_gap() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("transaction.log");
    fs::write(&path, "1\t1\tk1\tv1\n2\t1\tk2\tv2\n4\t1\tk3\tv3\n").unwrap();

    let (cache, store) = new_cache(8);
    let mut log = TransactionLog::open(&path).unwrap();
    let result = replay(&mut log, &cache);

    assert!(matches!(
        result,
        Err(KvError::OutOfSequence {
            line: 3,
            previous: 2,
            found: 4
        })
    ));
    // Events before the gap were applied, the offending one was not
    assert_eq!(store.len(), 2);
    assert!(store.get("k3").is_err());
}

#[test]
fn test_replay_applies_deletes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("transaction.log");
    fs::write(&path, "1\t1\ta\t1\n2\t1\tb\t2\n3\t2\ta\t\n4\t1\tb\t3\n").unwrap();

    let (cache, store) = new_cache(1);
    let mut log = TransactionLog::open(&path).unwrap();
    assert_eq!(replay(&mut log, &cache).unwrap(), 4);

    assert_eq!(store.len(), 1);
    assert_eq!(store.get("b").unwrap(), Bytes::from_static(b"3"));
    assert_eq!(log.last_sequence(), 4);
}

async fn write_ops(path: &Path, ops: &[(bool, String, String)]) {
    let config = Config {
        cache_capacity: 2,
        log_path: path.to_path_buf(),
        log_buffer: 3,
        ..Config::default()
    };
    let service = KvService::open(&config).unwrap();
    for (is_put, key, value) in ops {
        if *is_put {
            service.put(key, Bytes::from(value.clone())).await.unwrap();
        } else {
            service.delete(key).await.unwrap();
        }
    }
    service.shutdown().await.unwrap();
}

fn op_strategy() -> impl Strategy<Value = (bool, String, String)> {
    (any::<bool>(), "[a-e]", "[ -~]{0,8}")
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    // Replaying in one pass and replaying a prefix then resuming from its
    // last sequence produce the same store.
    #[test]
    fn prop_resumed_replay_matches_single_pass(
        ops in prop::collection::vec(op_strategy(), 1..40),
        split in any::<prop::sample::Index>()
    ) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transaction.log");
        runtime().block_on(write_ops(&path, &ops));

        let (full_cache, full_store) = new_cache(2);
        let mut log = TransactionLog::open(&path).unwrap();
        prop_assert_eq!(replay(&mut log, &full_cache).unwrap(), ops.len() as u64);

        let boundary = split.index(ops.len() + 1);
        let (cache, store) = new_cache(2);
        let mut log = TransactionLog::open(&path).unwrap();
        for event in log.read_events().unwrap().take(boundary) {
            let event = event.unwrap();
            match event.event_type {
                EventType::Put => cache.put(&event.key, event.value).unwrap(),
                EventType::Delete => cache.delete(&event.key).unwrap(),
            }
        }
        let resumed = replay_after(&mut log, &cache, boundary as u64).unwrap();

        prop_assert_eq!(resumed, (ops.len() - boundary) as u64);
        prop_assert_eq!(snapshot(&store), snapshot(&full_store));
    }

    // The restored store equals a plain map of the accepted operations.
    #[test]
    fn prop_restart_restores_final_state(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transaction.log");
        runtime().block_on(write_ops(&path, &ops));

        let mut model = BTreeMap::new();
        for (is_put, key, value) in &ops {
            if *is_put {
                model.insert(key.clone(), Bytes::from(value.clone()));
            } else {
                model.remove(key);
            }
        }

        let (cache, store) = new_cache(2);
        let mut log = TransactionLog::open(&path).unwrap();
        replay(&mut log, &cache).unwrap();
        prop_assert_eq!(snapshot(&store), model);
    }
}
