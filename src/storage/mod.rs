//! Local persistence of the application state
//!
//! Each entity is stored as one JSON blob under a fixed key. Values are read
//! once at startup and overwritten wholesale after every change.

use chrono::{DateTime, SubsecRound, Utc};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};

/// Key of the profile blob
pub const PROFILE_KEY: &str = "afya_profile";
/// Key of the vitals blob
pub const VITALS_KEY: &str = "afya_vitals";
/// Key of the meals blob
pub const MEALS_KEY: &str = "afya_meals";

/// Current time truncated to the millisecond precision of stored timestamps
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// A string key-value store scoped to one install
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Stores each key as `<key>.json` inside a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    /// Directory holding the blobs
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`, creating the directory if needed
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// The directory backing this store
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\', '.']) {
            return Err(Error::storage(format!("invalid key: {:?}", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        // Write then rename so a crash never leaves a half-written blob.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        debug!("stored {} ({} bytes)", key, value.len());
        Ok(())
    }
}

/// In-memory store; clones share the same map
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.values
            .lock()
            .map_err(|_| Error::storage("memory store lock poisoned"))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Load the value under `key`, falling back to `T::default()` when it is
/// absent, unreadable or malformed.
pub fn load_or_default<T>(store: &dyn KeyValueStore, key: &str) -> T
where
    T: DeserializeOwned + Default,
{
    match store.get(key) {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!("ignoring malformed {}: {}", key, e);
                T::default()
            }
        },
        Ok(None) => T::default(),
        Err(e) => {
            warn!("could not read {}: {}", key, e);
            T::default()
        }
    }
}

/// Serialize `value` and overwrite the blob under `key`
pub fn save<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        values: Vec<u32>,
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        let sample = Sample {
            name: "a".to_string(),
            values: vec![1, 2, 3],
        };
        save(&store, "sample", &sample).unwrap();
        let loaded: Sample = load_or_default(&store, "sample");
        assert_eq!(loaded, sample);
    }

    #[test]
    fn test_absent_key_yields_default() {
        let store = MemoryStore::new();
        let loaded: Sample = load_or_default(&store, "missing");
        assert_eq!(loaded, Sample::default());
    }

    #[test]
    fn test_malformed_value_yields_default() {
        let store = MemoryStore::new();
        store.set("sample", "{not json").unwrap();
        let loaded: Sample = load_or_default(&store, "sample");
        assert_eq!(loaded, Sample::default());
    }

    #[test]
    fn test_clones_share_values() {
        let store = MemoryStore::new();
        let other = store.clone();
        store.set("k", "v").unwrap();
        assert_eq!(other.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("nested")).unwrap();
        assert!(store.get(VITALS_KEY).unwrap().is_none());

        store.set(VITALS_KEY, "[]").unwrap();
        store.set(VITALS_KEY, "[1]").unwrap();
        assert_eq!(store.get(VITALS_KEY).unwrap().as_deref(), Some("[1]"));
        assert!(store.dir().join("afya_vitals.json").exists());
    }

    #[test]
    fn test_file_store_rejects_path_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        assert!(matches!(store.set("../escape", "x"), Err(Error::Storage(_))));
    }
}
