use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use super::{KeyValueStore, Result, StorageError};

/// Key-value store backed by a single JSON object on disk.
///
/// The file is rewritten in full on every `set`/`remove`, going through a
/// temporary sibling so a crash mid-write leaves the previous version intact.
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Opens the store at `path`, creating parent directories. A missing file
    /// starts out empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let entries = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&raw).map_err(|source| StorageError::Json {
                    key: path.display().to_string(),
                    source,
                })?
            }
        } else {
            BTreeMap::new()
        };

        debug!(path = %path.display(), keys = entries.len(), "opened key-value file");

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let json = serde_json::to_string_pretty(entries).map_err(|source| StorageError::Json {
            key: self.path.display().to_string(),
            source,
        })?;

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        let previous = entries.insert(key.to_string(), value);
        if let Err(err) = self.flush(&entries) {
            match previous {
                Some(old) => entries.insert(key.to_string(), old),
                None => entries.remove(key),
            };
            return Err(err);
        }
        Ok(())
    }

    /// Applies every entry and rewrites the file once. A failed write
    /// restores all of them.
    fn set_many(&self, batch: Vec<(String, String)>) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        let mut previous = Vec::with_capacity(batch.len());
        for (key, value) in batch {
            let old = entries.insert(key.clone(), value);
            previous.push((key, old));
        }

        if let Err(err) = self.flush(&entries) {
            for (key, old) in previous.into_iter().rev() {
                match old {
                    Some(old) => entries.insert(key, old),
                    None => entries.remove(&key),
                };
            }
            return Err(err);
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        if let Some(old) = entries.remove(key) {
            if let Err(err) = self.flush(&entries) {
                entries.insert(key.to_string(), old);
                return Err(err);
            }
        }
        Ok(())
    }
}
