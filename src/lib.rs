//! KV Cache - A cache-aside key-value server
//!
//! An LRU cache in front of a durable backing store, with requests executed
//! on a fixed pool of worker threads.

pub mod api;
pub mod cache;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod models;
pub mod pool;
pub mod store;

pub use api::AppState;
pub use config::Config;
pub use coordinator::CacheAside;
pub use pool::WorkerPool;
