//! Cache Entry Module
//!
//! Defines the key/value pair owned by the LRU cache.

// == Cache Entry ==
/// A single cached key-value pair.
///
/// Entries live inside the recency list and are never handed out by
/// reference across the cache lock; callers receive clones of the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry<K, V> {
    /// The lookup key
    pub key: K,
    /// The cached value
    pub value: V,
}

impl<K, V> CacheEntry<K, V> {
    // == Constructor ==
    /// Creates a new cache entry.
    pub fn new(key: K, value: V) -> Self {
        Self { key, value }
    }

    /// Replaces the stored value, returning the previous one.
    pub fn replace_value(&mut self, value: V) -> V {
        std::mem::replace(&mut self.value, value)
    }
}
