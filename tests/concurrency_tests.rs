//! Concurrency Tests
//!
//! Exercises the coordinator on the worker pool from many threads, and checks
//! that a stalled store call never blocks cache access.

use std::sync::mpsc;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

use kv_cache::cache::LruCache;
use kv_cache::coordinator::Source;
use kv_cache::error::{KvError, StoreResult};
use kv_cache::store::{BackingStore, MemoryStore};
use kv_cache::{CacheAside, WorkerPool};
use parking_lot::Mutex;

/// Store whose reads of `slow_key` block until released. The row is read
/// before blocking, so the returned value is the one present on entry.
struct GatedStore {
    inner: MemoryStore,
    slow_key: String,
    entered: Mutex<Option<mpsc::Sender<()>>>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl BackingStore for GatedStore {
    fn put(&self, key: &str, value: &str) -> StoreResult<()> {
        self.inner.put(key, value)
    }

    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let value = self.inner.get(key)?;
        if key == self.slow_key {
            if let Some(entered) = self.entered.lock().take() {
                let _ = entered.send(());
            }
            let _ = self.release.lock().recv();
        }
        Ok(value)
    }

    fn delete(&self, key: &str) -> StoreResult<bool> {
        self.inner.delete(key)
    }
}

#[test]
fn test_cache_stays_responsive_during_slow_store_call() {
    // Declared first so it is dropped last, after the release sender.
    let pool = WorkerPool::new(4).unwrap();
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let store = Arc::new(GatedStore {
        inner: MemoryStore::with_rows([("cold", "eventually")]),
        slow_key: "cold".to_string(),
        entered: Mutex::new(Some(entered_tx)),
        release: Mutex::new(release_rx),
    });
    let cache = Arc::new(LruCache::new(16));
    let service = Arc::new(CacheAside::new(Arc::clone(&cache), store));

    service.put("hot".to_string(), "ready".to_string()).unwrap();

    // A worker blocks inside the store on a cache miss.
    let slow_service = Arc::clone(&service);
    let slow = pool.execute(move || slow_service.get("cold")).unwrap();
    entered_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("slow read never reached the store");

    // Unrelated cache traffic, directly and through other workers.
    let started = Instant::now();
    assert_eq!(cache.get("hot"), Some("ready".to_string()));
    cache.put("other".to_string(), "x".to_string());

    let fast_service = Arc::clone(&service);
    let fast = pool.execute(move || fast_service.get("hot")).unwrap();
    let lookup = tokio_test::block_on(fast).unwrap().unwrap();
    assert_eq!(lookup.source, Source::Cache);
    assert!(
        started.elapsed() < Duration::from_secs(1),
        "cache access stalled behind the store call"
    );

    release_tx.send(()).unwrap();
    let lookup = tokio_test::block_on(slow).unwrap().unwrap();
    assert_eq!(lookup.value, "eventually");
    assert_eq!(lookup.source, Source::Database);

    pool.shutdown();
}

#[test]
fn test_read_through_fill_after_delete_leaves_stale_entry() {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let store = Arc::new(GatedStore {
        inner: MemoryStore::with_rows([("k", "v")]),
        slow_key: "k".to_string(),
        entered: Mutex::new(Some(entered_tx)),
        release: Mutex::new(release_rx),
    });
    let cache = Arc::new(LruCache::new(4));
    let service = Arc::new(CacheAside::new(Arc::clone(&cache), store.clone()));

    // The reader has fetched "v" from the store but not yet filled the cache.
    let reader_service = Arc::clone(&service);
    let reader = thread::spawn(move || reader_service.get("k"));
    entered_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("read never reached the store");

    service.delete("k").unwrap();
    release_tx.send(()).unwrap();

    let lookup = reader.join().unwrap().unwrap();
    assert_eq!(lookup.source, Source::Database);
    assert_eq!(store.inner.get("k").unwrap(), None);
    // The late fill puts the deleted value back until it is evicted.
    assert_eq!(cache.get("k"), Some("v".to_string()));
}

#[test]
fn test_concurrent_operations_on_disjoint_keys() {
    let threads = 8;
    let keys_per_thread = 50;
    let capacity = 128;
    let cache = Arc::new(LruCache::new(capacity));
    let store = Arc::new(MemoryStore::new());
    let service = Arc::new(CacheAside::new(Arc::clone(&cache), store.clone()));
    let pool = WorkerPool::new(threads).unwrap();
    let barrier = Arc::new(Barrier::new(threads));
    let failures = Arc::new(Mutex::new(Vec::new()));

    for t in 0..threads {
        let service = Arc::clone(&service);
        let barrier = Arc::clone(&barrier);
        let failures = Arc::clone(&failures);
        pool.submit(move || {
            barrier.wait();
            for i in 0..keys_per_thread {
                let key = format!("t{}-{}", t, i);
                let value = format!("v{}", i);
                if let Err(err) = service.put(key.clone(), value.clone()) {
                    failures.lock().push(format!("put {}: {}", key, err));
                    continue;
                }
                match service.get(&key) {
                    Ok(lookup) if lookup.value == value => {}
                    other => failures.lock().push(format!("get {}: {:?}", key, other)),
                }
                // Delete every third key.
                if i % 3 == 0 {
                    if let Err(err) = service.delete(&key) {
                        failures.lock().push(format!("delete {}: {}", key, err));
                    }
                }
            }
        })
        .unwrap();
    }
    pool.shutdown();

    assert!(failures.lock().is_empty(), "failures: {:?}", failures.lock());
    assert!(cache.len() <= capacity);
    assert!(cache.is_consistent());

    let expected_rows = threads * (keys_per_thread - (keys_per_thread + 2) / 3);
    assert_eq!(store.len(), expected_rows);
    for t in 0..threads {
        for i in (0..keys_per_thread).filter(|i| i % 3 == 0) {
            let key = format!("t{}-{}", t, i);
            assert!(matches!(service.get(&key), Err(KvError::NotFound(_))));
        }
    }
}

#[test]
fn test_concurrent_misses_on_same_key_all_succeed() {
    let store = Arc::new(MemoryStore::with_rows([("shared", "value")]));
    let cache = Arc::new(LruCache::new(4));
    let service = Arc::new(CacheAside::new(Arc::clone(&cache), store));
    let pool = WorkerPool::new(8).unwrap();

    let replies: Vec<_> = (0..32)
        .map(|_| {
            let service = Arc::clone(&service);
            pool.execute(move || service.get("shared")).unwrap()
        })
        .collect();

    for reply in replies {
        let lookup = tokio_test::block_on(reply).unwrap().unwrap();
        assert_eq!(lookup.value, "value");
    }
    assert_eq!(cache.len(), 1);
    assert!(cache.is_consistent());
    pool.shutdown();
}
