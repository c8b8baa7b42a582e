//! In-memory backing store, used by tests and `STORE_BACKEND=memory`.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::StoreResult;
use crate::store::BackingStore;

/// Non-durable store backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `rows`.
    pub fn with_rows<I, K, V>(rows: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            rows: RwLock::new(
                rows.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

impl BackingStore for MemoryStore {
    fn put(&self, key: &str, value: &str) -> StoreResult<()> {
        self.rows.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.rows.read().get(key).cloned())
    }

    fn delete(&self, key: &str) -> StoreResult<bool> {
        Ok(self.rows.write().remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_delete() {
        let store = MemoryStore::new();

        store.put("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v".to_string()));

        assert!(store.delete("k").unwrap());
        assert!(!store.delete("k").unwrap());
        assert_eq!(store.get("k").unwrap(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_with_rows() {
        let store = MemoryStore::with_rows([("a", "1"), ("b", "2")]);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("b").unwrap(), Some("2".to_string()));
    }
}
