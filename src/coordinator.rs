//! Cache-Aside Coordinator
//!
//! Decides the order of cache and store operations for GET, PUT and DELETE.
//!
//! # Consistency
//! Writes go to the store first and reach the cache only after the store
//! accepted them, so the cache never holds an uncommitted value. There is no
//! transaction spanning both: two concurrent PUTs to one key may commit to
//! the store in one order and land in the cache in the other, leaving the
//! cache stale until the entry is rewritten, removed or evicted.
//!
//! Read-through fills race the same way. A GET that misses reads `v` from
//! the store; if a DELETE or PUT for that key commits and updates the cache
//! before the GET fills it, the fill puts `v` back. The cache then serves the
//! deleted or superseded value until the entry is rewritten or evicted.
//!
//! The cache lock is never held while the store is called.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::{CacheStats, LruCache};
use crate::error::{KvError, Result};
use crate::store::BackingStore;

/// Where a GET was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Cache,
    Database,
}

/// Successful GET result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    pub value: String,
    pub source: Source,
}

// == Cache Aside ==
/// Coordinates an [`LruCache`] with a [`BackingStore`].
///
/// Both collaborators are injected; the coordinator owns no global state.
pub struct CacheAside {
    cache: Arc<LruCache<String, String>>,
    store: Arc<dyn BackingStore>,
    invalidate_on_missing_delete: bool,
}

impl CacheAside {
    pub fn new(cache: Arc<LruCache<String, String>>, store: Arc<dyn BackingStore>) -> Self {
        Self {
            cache,
            store,
            invalidate_on_missing_delete: false,
        }
    }

    /// When enabled, a DELETE that finds nothing in the store still drops
    /// any cache entry for the key.
    pub fn with_invalidate_on_missing_delete(mut self, enabled: bool) -> Self {
        self.invalidate_on_missing_delete = enabled;
        self
    }

    // == Put ==
    /// Writes the store, then the cache. A store failure leaves the cache
    /// untouched.
    pub fn put(&self, key: String, value: String) -> Result<()> {
        debug!("PUT '{}': writing {} bytes to store", key, value.len());
        if let Err(err) = self.store.put(&key, &value) {
            warn!("PUT '{}': store write failed: {}", key, err);
            return Err(err.into());
        }

        if let Some(evicted) = self.cache.put(key.clone(), value) {
            debug!("PUT '{}': evicted '{}' from cache", key, evicted);
        }
        debug!("PUT '{}': committed and cached", key);
        Ok(())
    }

    // == Get ==
    /// Serves from the cache, falling back to the store and filling the
    /// cache on a store hit. Concurrent misses on one key each read the
    /// store; the resulting fills are idempotent.
    pub fn get(&self, key: &str) -> Result<Lookup> {
        if let Some(value) = self.cache.get(key) {
            debug!("GET '{}': cache hit", key);
            return Ok(Lookup {
                value,
                source: Source::Cache,
            });
        }
        debug!("GET '{}': cache miss, reading store", key);

        let value = match self.store.get(key) {
            Ok(Some(value)) => value,
            Ok(None) => {
                debug!("GET '{}': not in store", key);
                return Err(KvError::NotFound(key.to_string()));
            }
            Err(err) => {
                warn!("GET '{}': store read failed: {}", key, err);
                return Err(err.into());
            }
        };

        if let Some(evicted) = self.cache.put(key.to_string(), value.clone()) {
            debug!("GET '{}': evicted '{}' from cache", key, evicted);
        }
        debug!("GET '{}': served from store and cached", key);
        Ok(Lookup {
            value,
            source: Source::Database,
        })
    }

    // == Delete ==
    /// Deletes from the store, then from the cache.
    pub fn delete(&self, key: &str) -> Result<()> {
        debug!("DELETE '{}': deleting from store", key);
        match self.store.delete(key) {
            Ok(true) => {
                self.cache.remove(key);
                debug!("DELETE '{}': removed from store and cache", key);
                Ok(())
            }
            Ok(false) => {
                if self.invalidate_on_missing_delete && self.cache.remove(key).is_some() {
                    debug!("DELETE '{}': dropped stale cache entry", key);
                }
                debug!("DELETE '{}': not in store", key);
                Err(KvError::NotFound(key.to_string()))
            }
            Err(err) => {
                warn!("DELETE '{}': store delete failed: {}", key, err);
                Err(err.into())
            }
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn cache(&self) -> &Arc<LruCache<String, String>> {
        &self.cache
    }

    pub fn store(&self) -> &Arc<dyn BackingStore> {
        &self.store
    }
}

impl std::fmt::Debug for CacheAside {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheAside")
            .field("cache", &self.cache)
            .field(
                "invalidate_on_missing_delete",
                &self.invalidate_on_missing_delete,
            )
            .finish_non_exhaustive()
    }
}
