//! Flat key-value persistence.
//!
//! Every collection lives under one fixed key as a JSON array and is
//! overwritten as a whole on each save. There is no merging or versioning:
//! the last writer wins.

mod file;
mod memory;

use std::io;

use serde::de::DeserializeOwned;
use serde::Serialize;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

pub const TRIPS_KEY: &str = "trips";
pub const DRIVERS_KEY: &str = "drivers";
pub const DRIVER_UPDATES_KEY: &str = "driverUpdates";
pub const ASSIGNMENTS_KEY: &str = "assignments";
pub const GEOFENCES_KEY: &str = "geofences";
pub const DELAY_REPORTS_KEY: &str = "delayReports";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error under key {key}: {source}")]
    Json {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("store lock poisoned")]
    Poisoned,
}

pub type Result<T> = core::result::Result<T, StorageError>;

/// String-valued key-value store, shaped like the device storage the
/// mobile client writes to.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: String) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;

    /// Writes several keys as one unit. Stores that can only write one key
    /// at a time fall back to a `set` per entry.
    fn set_many(&self, entries: Vec<(String, String)>) -> Result<()> {
        for (key, value) in entries {
            self.set(&key, value)?;
        }
        Ok(())
    }
}

/// Reads the array stored under `key`. A missing key is an empty collection.
pub fn load_collection<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Vec<T>> {
    match store.get(key)? {
        Some(raw) => serde_json::from_str(&raw).map_err(|source| StorageError::Json {
            key: key.to_string(),
            source,
        }),
        None => Ok(Vec::new()),
    }
}

/// Replaces the whole array stored under `key`.
pub fn save_collection<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    items: &[T],
) -> Result<()> {
    let (key, raw) = encode_collection(key, items)?;
    store.set(&key, raw)
}

/// Serializes `items` into the `(key, value)` pair [`KeyValueStore::set_many`]
/// takes.
pub fn encode_collection<T: Serialize>(key: &str, items: &[T]) -> Result<(String, String)> {
    let raw = serde_json::to_string(items).map_err(|source| StorageError::Json {
        key: key.to_string(),
        source,
    })?;
    Ok((key.to_string(), raw))
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: u64,
        label: String,
    }

    #[test]
    fn missing_key_loads_as_empty() {
        let store = MemoryStore::new();
        let rows: Vec<Row> = load_collection(&store, TRIPS_KEY).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn save_overwrites_previous_collection() {
        let store = MemoryStore::new();
        let first = vec![
            Row { id: 1, label: "a".into() },
            Row { id: 2, label: "b".into() },
        ];
        save_collection(&store, TRIPS_KEY, &first).unwrap();

        let second = vec![Row { id: 3, label: "c".into() }];
        save_collection(&store, TRIPS_KEY, &second).unwrap();

        let loaded: Vec<Row> = load_collection(&store, TRIPS_KEY).unwrap();
        assert_eq!(loaded, second);
    }

    #[test]
    fn corrupt_value_reports_key() {
        let store = MemoryStore::new();
        store.set(GEOFENCES_KEY, "{not json".to_string()).unwrap();

        let err = load_collection::<Row>(&store, GEOFENCES_KEY).unwrap_err();
        assert!(err.to_string().contains(GEOFENCES_KEY));
    }

    #[test]
    fn set_many_writes_every_key() {
        let store = MemoryStore::new();
        let rows = vec![Row { id: 1, label: "a".into() }];
        store
            .set_many(vec![
                encode_collection(TRIPS_KEY, &rows).unwrap(),
                encode_collection(DRIVERS_KEY, &rows).unwrap(),
            ])
            .unwrap();

        let trips: Vec<Row> = load_collection(&store, TRIPS_KEY).unwrap();
        let drivers: Vec<Row> = load_collection(&store, DRIVERS_KEY).unwrap();
        assert_eq!(trips, rows);
        assert_eq!(drivers, rows);
    }
}
