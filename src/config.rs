//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::warn;

/// Which backing store implementation to open at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// JSON file at `store_path`
    File,
    /// Process memory only, nothing survives a restart
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(StoreBackend::File),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the LRU cache can hold
    pub cache_capacity: usize,
    /// Number of worker threads executing requests
    pub worker_threads: usize,
    /// HTTP server port
    pub server_port: u16,
    /// Backing store implementation
    pub store_backend: StoreBackend,
    /// Data file for the file store
    pub store_path: PathBuf,
    /// Drop cache entries for keys whose store delete matched nothing
    pub invalidate_on_missing_delete: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Maximum cache entries (default: 100)
    /// - `WORKER_THREADS` - Worker pool size (default: 16)
    /// - `SERVER_PORT` - HTTP server port (default: 8080)
    /// - `STORE_BACKEND` - `file` or `memory` (default: file)
    /// - `STORE_PATH` - File store location (default: kv_store.json)
    /// - `INVALIDATE_ON_MISSING_DELETE` - `1`/`0`, `true`/`false`, `yes`/`no`
    ///   or `on`/`off` (default: false)
    ///
    /// Unparseable values fall back to defaults with a warning, as does zero
    /// for the two sizes.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_capacity: parse_var("CACHE_CAPACITY")
                .filter(|&n: &usize| n > 0)
                .unwrap_or(defaults.cache_capacity),
            worker_threads: parse_var("WORKER_THREADS")
                .filter(|&n: &usize| n > 0)
                .unwrap_or(defaults.worker_threads),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            store_backend: parse_var("STORE_BACKEND").unwrap_or(defaults.store_backend),
            store_path: env::var("STORE_PATH")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.store_path),
            invalidate_on_missing_delete: read_var("INVALIDATE_ON_MISSING_DELETE", parse_flag)
                .unwrap_or(defaults.invalidate_on_missing_delete),
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    read_var(name, |v| v.parse().ok())
}

/// Reads and parses a variable, warning when it is set but unusable.
fn read_var<T>(name: &str, parse: impl FnOnce(&str) -> Option<T>) -> Option<T> {
    let raw = env::var(name).ok()?;
    let parsed = parse(raw.trim());
    if parsed.is_none() {
        warn!("Ignoring invalid {}='{}', using default", name, raw);
    }
    parsed
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_capacity: 100,
            worker_threads: 16,
            server_port: 8080,
            store_backend: StoreBackend::File,
            store_path: PathBuf::from("kv_store.json"),
            invalidate_on_missing_delete: false,
        }
    }
}
