//! File-backed store
//!
//! Persists all rows as a single JSON object. Every mutation rewrites the
//! file through a temporary sibling and an atomic rename, so a crash leaves
//! either the old or the new contents on disk.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::store::BackingStore;

/// Durable store writing through to a JSON file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    rows: Mutex<HashMap<String, String>>,
}

impl FileStore {
    // == Open ==
    /// Opens the store at `path`, creating an empty file if none exists.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();

        let rows = if path.exists() {
            let bytes = fs::read(&path)?;
            if bytes.is_empty() {
                HashMap::new()
            } else {
                serde_json::from_slice(&bytes)?
            }
        } else {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            let rows = HashMap::new();
            persist(&path, &rows)?;
            rows
        };

        info!("Opened file store at {} with {} rows", path.display(), rows.len());

        Ok(Self {
            path,
            rows: Mutex::new(rows),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.rows.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.lock().is_empty()
    }
}

impl BackingStore for FileStore {
    fn put(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut rows = self.rows.lock();
        let previous = rows.insert(key.to_string(), value.to_string());

        if let Err(err) = persist(&self.path, &rows) {
            warn!("Rolling back put of '{}': {}", key, err);
            match previous {
                Some(old) => rows.insert(key.to_string(), old),
                None => rows.remove(key),
            };
            return Err(err);
        }

        debug!("Persisted key '{}'", key);
        Ok(())
    }

    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.rows.lock().get(key).cloned())
    }

    fn delete(&self, key: &str) -> StoreResult<bool> {
        let mut rows = self.rows.lock();
        let Some(previous) = rows.remove(key) else {
            return Ok(false);
        };

        if let Err(err) = persist(&self.path, &rows) {
            warn!("Rolling back delete of '{}': {}", key, err);
            rows.insert(key.to_string(), previous);
            return Err(err);
        }

        debug!("Deleted key '{}' from file store", key);
        Ok(true)
    }

    fn ping(&self) -> StoreResult<()> {
        let metadata = fs::metadata(&self.path)?;
        if metadata.permissions().readonly() {
            return Err(StoreError::Unavailable(format!(
                "{} is read-only",
                self.path.display()
            )));
        }
        Ok(())
    }
}

/// Writes `rows` to a temporary file next to `path`, then renames it over.
fn persist(path: &Path, rows: &HashMap<String, String>) -> StoreResult<()> {
    let mut tmp_name = path.as_os_str().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    let mut file = fs::File::create(&tmp_path)?;
    serde_json::to_writer(&mut file, rows)?;
    file.flush()?;
    file.sync_all()?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}
