//! Cache Module
//!
//! Provides the in-memory LRU cache that fronts the backing store.

mod concurrent;
mod entry;
mod lru;
mod stats;


// Re-export public types
pub use concurrent::LruCache;
pub use entry::CacheEntry;
pub use lru::RecencyList;
pub use stats::CacheStats;
