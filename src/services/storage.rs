//! Durable key-value storage for settings that survive a restart

use std::{
    collections::BTreeMap,
    fs,
    io::ErrorKind,
    path::PathBuf,
    sync::Mutex,
};
use tracing::debug;

use crate::error::StoreError;

/// Integer key-value store. Writes are expected to be durable once they return.
pub trait KeyValueStore: Send + Sync {
    /// Read a value; `Ok(None)` when the key has never been written
    fn load_i8(&self, key: &str) -> Result<Option<i8>, StoreError>;

    fn store_i8(&self, key: &str, value: i8) -> Result<(), StoreError>;
}

/// Store backed by a single JSON object on disk
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    // Serialises read-modify-write cycles on the file
    guard: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    fn read_map(&self) -> Result<BTreeMap<String, i64>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl KeyValueStore for JsonFileStore {
    fn load_i8(&self, key: &str) -> Result<Option<i8>, StoreError> {
        let _guard = self.guard.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let map = self.read_map()?;

        match map.get(key) {
            None => Ok(None),
            Some(&raw) => i8::try_from(raw)
                .map(Some)
                .map_err(|_| StoreError::Unavailable(format!("{} holds non-i8 value {}", key, raw))),
        }
    }

    fn store_i8(&self, key: &str, value: i8) -> Result<(), StoreError> {
        let _guard = self.guard.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

        // A corrupt file is replaced rather than blocking every future write
        let mut map = self.read_map().unwrap_or_default();
        map.insert(key.to_string(), i64::from(value));

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&map)?)?;
        fs::rename(&tmp, &self.path)?;

        debug!("Stored {}={} in {}", key, value, self.path.display());
        Ok(())
    }
}

/// Volatile store for simulation and tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryStoreInner>,
}

#[derive(Debug, Default)]
struct MemoryStoreInner {
    values: BTreeMap<String, i8>,
    writes: usize,
    unavailable: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful writes so far
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    /// Make every following load and store fail
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryStoreInner> {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryStore {
    fn load_i8(&self, key: &str) -> Result<Option<i8>, StoreError> {
        let inner = self.lock();
        if inner.unavailable {
            return Err(StoreError::Unavailable("memory store switched off".to_string()));
        }
        Ok(inner.values.get(key).copied())
    }

    fn store_i8(&self, key: &str, value: i8) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if inner.unavailable {
            return Err(StoreError::Unavailable("memory store switched off".to_string()));
        }
        inner.values.insert(key.to_string(), value);
        inner.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn scratch_file(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("dual-light-{}-{}.json", name, std::process::id()));
        let _ = fs::remove_file(&path);
        path
    }

    #[test]
    fn json_store_survives_reopen() {
        let path = scratch_file("reopen");
        JsonFileStore::new(&path).store_i8("curr_channel", 1).unwrap();

        let reopened = JsonFileStore::new(&path);
        assert_eq!(reopened.load_i8("curr_channel").unwrap(), Some(1));
        assert_eq!(reopened.load_i8("other").unwrap(), None);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let path = scratch_file("missing");
        assert_eq!(JsonFileStore::new(&path).load_i8("curr_channel").unwrap(), None);
        assert!(!Path::new(&path).exists());
    }

    #[test]
    fn corrupt_file_is_an_error_and_is_replaced_on_write() {
        let path = scratch_file("corrupt");
        fs::write(&path, "{not json").unwrap();
        let store = JsonFileStore::new(&path);

        assert!(matches!(store.load_i8("curr_channel"), Err(StoreError::Corrupt(_))));

        store.store_i8("curr_channel", 0).unwrap();
        assert_eq!(store.load_i8("curr_channel").unwrap(), Some(0));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn unavailable_memory_store_fails_both_ways() {
        let store = MemoryStore::new();
        store.set_unavailable(true);

        assert!(store.store_i8("k", 1).is_err());
        assert!(store.load_i8("k").is_err());
        assert_eq!(store.write_count(), 0);
    }
}
