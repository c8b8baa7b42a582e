//! Response DTOs for the key-value API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::coordinator::{Lookup, Source};

/// Response body for GET /kv/*key
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// The stored value
    pub value: String,
    /// `cache` or `database`
    pub source: Source,
}

impl GetResponse {
    pub fn new(key: impl Into<String>, lookup: Lookup) -> Self {
        Self {
            key: key.into(),
            value: lookup.value,
            source: lookup.source,
        }
    }
}

/// Response body for PUT /kv/*key, POST /kv and DELETE /kv/*key
#[derive(Debug, Clone, Serialize)]
pub struct WriteResponse {
    /// `stored`, `created` or `deleted`
    pub status: &'static str,
    /// The key that was written
    pub key: String,
}

impl WriteResponse {
    pub fn stored(key: impl Into<String>) -> Self {
        Self {
            status: "stored",
            key: key.into(),
        }
    }

    pub fn created(key: impl Into<String>) -> Self {
        Self {
            status: "created",
            key: key.into(),
        }
    }

    pub fn deleted(key: impl Into<String>) -> Self {
        Self {
            status: "deleted",
            key: key.into(),
        }
    }
}

/// Worker pool section of the stats response
#[derive(Debug, Clone, Serialize)]
pub struct PoolStats {
    /// Number of worker threads
    pub workers: usize,
    /// Tasks waiting for a worker
    pub queued: usize,
    /// Tasks that panicked
    pub panicked: u64,
}

/// Response body for GET /stats
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Number of evictions
    pub evictions: u64,
    /// Current number of entries in cache
    pub total_entries: usize,
    /// Cache capacity
    pub capacity: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    pub pool: PoolStats,
}

impl StatsResponse {
    pub fn new(stats: &CacheStats, pool: PoolStats) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            total_entries: stats.total_entries,
            capacity: stats.capacity,
            hit_rate: stats.hit_rate(),
            pool,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
