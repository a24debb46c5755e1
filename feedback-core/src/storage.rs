// File: feedback-core/src/storage.rs
//
// Small key/value store for client-side state: the in-progress feedback
// draft, a per-device marker, the restaurant an owner last selected.
// Advisory only: losing the file loses nothing the backend does not have.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::Error;

pub const DEVICE_ID_KEY: &str = "device_id";

pub fn draft_key(restaurant_slug: &str) -> String {
    format!("feedback_draft:{restaurant_slug}")
}

pub fn selected_restaurant_key(owner_uid: &str) -> String {
    format!("selected_restaurant:{owner_uid}")
}

pub struct LocalStore {
    path: Option<PathBuf>,
    values: Mutex<BTreeMap<String, Value>>,
}

impl LocalStore {
    /// Store that never touches disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            values: Mutex::new(BTreeMap::new()),
        }
    }

    /// Opens (or starts) a JSON file store. An unreadable or corrupt file
    /// is logged and replaced by an empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let values = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<BTreeMap<String, Value>>(&raw) {
                Ok(values) => values,
                Err(e) => {
                    warn!("Local store {} is corrupt ({}); starting empty", path.display(), e);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!("Opened local store {} with {} key(s)", path.display(), values.len());
        Ok(Self {
            path: Some(path),
            values: Mutex::new(values),
        })
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.values.lock().get(key).cloned()?;
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("Discarding unreadable local value key={}: {}", key, e);
                None
            }
        }
    }

    /// Memory only changes once the file write went through.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), Error> {
        let value = serde_json::to_value(value)?;
        let mut values = self.values.lock();
        let mut next = values.clone();
        next.insert(key.to_string(), value);
        self.persist(&next)?;
        *values = next;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<(), Error> {
        let mut values = self.values.lock();
        if !values.contains_key(key) {
            return Ok(());
        }
        let mut next = values.clone();
        next.remove(key);
        self.persist(&next)?;
        *values = next;
        Ok(())
    }

    /// The device marker, created on first use.
    pub fn device_id(&self) -> Result<String, Error> {
        if let Some(id) = self.get::<String>(DEVICE_ID_KEY) {
            return Ok(id);
        }
        let id = Uuid::new_v4().to_string();
        self.set(DEVICE_ID_KEY, &id)?;
        Ok(id)
    }

    fn persist(&self, values: &BTreeMap<String, Value>) -> Result<(), Error> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(values)?)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn values_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let store = LocalStore::open(&path).unwrap();
        let device = store.device_id().unwrap();
        store.set(&selected_restaurant_key("owner-1"), &42i64).unwrap();

        let reopened = LocalStore::open(&path).unwrap();
        assert_eq!(reopened.device_id().unwrap(), device);
        assert_eq!(reopened.get::<i64>(&selected_restaurant_key("owner-1")), Some(42));

        reopened.remove(&selected_restaurant_key("owner-1")).unwrap();
        assert_eq!(LocalStore::open(&path).unwrap().get::<i64>(&selected_restaurant_key("owner-1")), None);
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "{not json").unwrap();

        let store = LocalStore::open(&path).unwrap();
        assert_eq!(store.get::<String>(DEVICE_ID_KEY), None);
    }

    #[test]
    fn failed_write_leaves_memory_as_it_was() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        let store = LocalStore::open(&path).unwrap();
        store.set("kept", &1i64).unwrap();

        // the staging file cannot be written over a directory
        fs::create_dir(path.with_extension("tmp")).unwrap();

        assert!(store.set("lost", &2i64).is_err());
        assert_eq!(store.get::<i64>("lost"), None);
        assert!(store.remove("kept").is_err());
        assert_eq!(store.get::<i64>("kept"), Some(1));
        assert_eq!(LocalStore::open(&path).unwrap().get::<i64>("kept"), Some(1));
    }
}
