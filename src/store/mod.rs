//! Backing Store Module
//!
//! The durable source of truth that the cache fronts. The coordinator only
//! depends on the [`BackingStore`] trait; concrete stores decide their own
//! internal locking.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::StoreResult;

// == Backing Store Trait ==
/// Durable key-value persistence consumed by the cache-aside coordinator.
///
/// Implementations are called from worker threads and may block.
pub trait BackingStore: Send + Sync {
    /// Inserts or overwrites `key`.
    fn put(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Reads `key`; `Ok(None)` means the key does not exist.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Deletes `key`. `Ok(true)` when a row was removed, `Ok(false)` when
    /// nothing matched; failures are reported as errors.
    fn delete(&self, key: &str) -> StoreResult<bool>;

    /// Verifies the store is reachable. Called once at startup.
    fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
