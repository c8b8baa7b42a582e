//! Thread-safe LRU Cache
//!
//! Wraps the recency list and its statistics in one mutex so every
//! operation is observed atomically by concurrent callers.

use std::borrow::Borrow;
use std::hash::Hash;

use parking_lot::Mutex;

use crate::cache::{CacheStats, RecencyList};

struct Inner<K, V> {
    list: RecencyList<K, V>,
    stats: CacheStats,
}

// == LRU Cache ==
/// Capacity-bounded, linearizable LRU cache.
///
/// A single lock covers the key index, the recency list and the counters.
/// Every operation is in-memory and holds the lock only briefly; callers must
/// never hold it across I/O, which the API enforces by returning owned values.
pub struct LruCache<K, V> {
    inner: Mutex<Inner<K, V>>,
    capacity: usize,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Creates a cache holding at most `capacity` entries.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                list: RecencyList::new(capacity),
                stats: CacheStats::new(capacity),
            }),
            capacity,
        }
    }

    // == Get ==
    /// Returns a clone of the cached value and marks the key most recently
    /// used. A miss leaves the structure unchanged.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut inner = self.inner.lock();
        let Inner { list, stats } = &mut *inner;
        match list.get(key) {
            Some(value) => {
                stats.record_hit();
                Some(value.clone())
            }
            None => {
                stats.record_miss();
                None
            }
        }
    }

    // == Put ==
    /// Inserts or refreshes an entry, evicting the least recently used entry
    /// when a new key would exceed capacity. Returns the evicted key.
    pub fn put(&self, key: K, value: V) -> Option<K> {
        let mut inner = self.inner.lock();
        let evicted = inner.list.put(key, value).map(|entry| entry.key);
        if evicted.is_some() {
            inner.stats.record_eviction();
        }
        evicted
    }

    // == Remove ==
    /// Removes a key if present, returning its value.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().list.remove(key)
    }

    /// Membership test that does not count as a use or a lookup.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().list.contains(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().list.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drops all entries and resets the counters.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.list.clear();
        inner.stats.reset();
    }

    // == Stats ==
    /// Returns a snapshot of the counters and current size.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        let mut stats = inner.stats.clone();
        stats.set_total_entries(inner.list.len());
        stats
    }

    /// Verifies list/index consistency under the lock.
    pub fn is_consistent(&self) -> bool {
        self.inner.lock().list.is_consistent()
    }
}

impl<K, V> std::fmt::Debug for LruCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LruCache")
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}
