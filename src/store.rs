//! Driver store abstraction.
//!
//! The reconciliation core only ever sees driver lists; where they persist
//! is behind the `DriverStore` trait (the original tool kept them in the
//! RSLinx registry hive). Two implementations live here: an in-memory
//! store for tests and seeding, and a JSON-file store used by the CLI.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::driver::EthDriver;

/// Errors produced by driver store implementations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("cannot save driver '{name}': no store key assigned")]
    EmptyKey { name: String },

    #[error("failed to access driver store '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("driver store is corrupt: {0}")]
    Json(#[from] serde_json::Error),
}

/// Persistence collaborator for driver sets.
///
/// `save` upserts one driver by its key name and must be idempotent per
/// key; `delete` of an absent key succeeds. Implementations persist one
/// driver per call; there is no multi-driver transaction.
pub trait DriverStore {
    /// Load every persisted driver.
    fn load_all(&self) -> Result<Vec<EthDriver>, StoreError>;

    /// Create or overwrite the driver stored under its key name.
    fn save(&mut self, driver: &EthDriver) -> Result<(), StoreError>;

    /// Remove the driver stored under `key_name`, if any.
    fn delete(&mut self, key_name: &str) -> Result<(), StoreError>;
}

/// In-memory driver store, keyed by driver key name.
#[derive(Debug, Default)]
pub struct MemoryStore {
    drivers: BTreeMap<String, EthDriver>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with the given drivers.
    pub fn with_drivers(drivers: impl IntoIterator<Item = EthDriver>) -> Self {
        MemoryStore {
            drivers: drivers
                .into_iter()
                .map(|d| (d.key_name.clone(), d))
                .collect(),
        }
    }
}

impl DriverStore for MemoryStore {
    fn load_all(&self) -> Result<Vec<EthDriver>, StoreError> {
        Ok(self.drivers.values().cloned().collect())
    }

    fn save(&mut self, driver: &EthDriver) -> Result<(), StoreError> {
        if driver.key_name.is_empty() {
            return Err(StoreError::EmptyKey {
                name: driver.name.clone(),
            });
        }
        self.drivers.insert(driver.key_name.clone(), driver.clone());
        Ok(())
    }

    fn delete(&mut self, key_name: &str) -> Result<(), StoreError> {
        self.drivers.remove(key_name);
        Ok(())
    }
}

/// On-disk document format for the JSON store.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    drivers: Vec<EthDriver>,
}

/// Driver store backed by a single pretty-printed JSON file.
///
/// A missing file reads as an empty store, so a fresh path works without
/// any initialization step. Every mutation rewrites the whole document.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn read_document(&self) -> Result<StoreDocument, StoreError> {
        if !self.path.exists() {
            return Ok(StoreDocument::default());
        }
        let text = fs::read_to_string(&self.path).map_err(|e| self.io_err(e))?;
        Ok(serde_json::from_str(&text)?)
    }

    fn write_document(&self, doc: &StoreDocument) -> Result<(), StoreError> {
        let text = serde_json::to_string_pretty(doc)?;
        fs::write(&self.path, text).map_err(|e| self.io_err(e))
    }
}

impl DriverStore for JsonFileStore {
    fn load_all(&self) -> Result<Vec<EthDriver>, StoreError> {
        let doc = self.read_document()?;
        log::debug!(
            "Loaded {} driver(s) from store '{}'",
            doc.drivers.len(),
            self.path.display()
        );
        Ok(doc.drivers)
    }

    fn save(&mut self, driver: &EthDriver) -> Result<(), StoreError> {
        if driver.key_name.is_empty() {
            return Err(StoreError::EmptyKey {
                name: driver.name.clone(),
            });
        }

        let mut doc = self.read_document()?;
        match doc.drivers.iter_mut().find(|d| d.key_name == driver.key_name) {
            Some(slot) => *slot = driver.clone(),
            None => doc.drivers.push(driver.clone()),
        }
        self.write_document(&doc)
    }

    fn delete(&mut self, key_name: &str) -> Result<(), StoreError> {
        let mut doc = self.read_document()?;
        let before = doc.drivers.len();
        doc.drivers.retain(|d| d.key_name != key_name);
        if doc.drivers.len() == before {
            // Deleting an absent key is not an error
            return Ok(());
        }
        self.write_document(&doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver(key: &str, name: &str) -> EthDriver {
        let mut d = EthDriver::new(name);
        d.key_name = key.to_string();
        d
    }

    #[test]
    fn test_memory_store_round_trip() {
        let mut store = MemoryStore::new();
        store.save(&driver("AB_ETH-1", "A")).unwrap();
        store.save(&driver("AB_ETH-2", "B")).unwrap();

        let drivers = store.load_all().unwrap();
        assert_eq!(drivers.len(), 2);

        store.delete("AB_ETH-1").unwrap();
        assert_eq!(store.load_all().unwrap().len(), 1);
    }

    #[test]
    fn test_memory_store_rejects_unkeyed_driver() {
        let mut store = MemoryStore::new();
        let result = store.save(&EthDriver::new("NO-KEY"));
        assert!(matches!(result, Err(StoreError::EmptyKey { .. })));
    }

    #[test]
    fn test_json_store_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("drivers.json"));
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_json_store_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("drivers.json"));

        let mut d = driver("AB_ETH-3", "PLANT-2");
        d.nodes = vec!["10.0.0.1".to_string(), "10.0.0.2".to_string()];
        store.save(&d).unwrap();

        let drivers = store.load_all().unwrap();
        assert_eq!(drivers, vec![d]);
    }

    #[test]
    fn test_json_store_save_is_an_upsert() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("drivers.json"));

        store.save(&driver("AB_ETH-1", "OLD")).unwrap();
        store.save(&driver("AB_ETH-1", "NEW")).unwrap();

        let drivers = store.load_all().unwrap();
        assert_eq!(drivers.len(), 1);
        assert_eq!(drivers[0].name, "NEW");
    }

    #[test]
    fn test_json_store_delete_absent_key_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("drivers.json"));
        assert!(store.delete("AB_ETH-99").is_ok());
    }

    #[test]
    fn test_json_store_rejects_unkeyed_driver() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("drivers.json"));
        let result = store.save(&EthDriver::new("NO-KEY"));
        assert!(matches!(result, Err(StoreError::EmptyKey { .. })));
    }
}
