use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use super::StorageError;

/// Storage key holding the bearer token
pub const TOKEN_KEY: &str = "token";

/// Storage key holding the token expiry in seconds since epoch
pub const TOKEN_EXP_KEY: &str = "token_exp";

/// Storage file name in the data directory
const STORAGE_FILE: &str = "storage.json";

/// Durable string key-value storage shared by every session component.
///
/// Each write replaces the whole value; implementations must make a
/// `remove` of an absent key a no-op.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Process-local storage. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        // A poisoned map is still a valid map
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries().remove(key);
        Ok(())
    }
}

/// JSON map persisted to `<dir>/storage.json`, rewritten on every change.
pub struct FileStore {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            lock: Mutex::new(()),
        }
    }

    fn storage_path(&self) -> PathBuf {
        self.dir.join(STORAGE_FILE)
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let path = self.storage_path();
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Write a sibling file and rename it over the old one, so readers see
    /// either the previous map or the new one.
    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir)?;
        let contents = serde_json::to_string_pretty(entries)?;
        let staging = self.dir.join(format!("{}.tmp", STORAGE_FILE));
        std::fs::write(&staging, contents)?;
        if let Err(e) = std::fs::rename(&staging, self.storage_path()) {
            let _ = std::fs::remove_file(&staging);
            return Err(e.into());
        }
        Ok(())
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.guard();
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.guard();
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.guard();
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }
}

/// The token and expiry records on top of a shared backend.
///
/// Clone is cheap; every clone reads and writes the same backend.
#[derive(Clone)]
pub struct TokenStore {
    backend: Arc<dyn KeyValueStore>,
}

impl TokenStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// A store backed by process memory only
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn save(&self, token: &str) -> Result<(), StorageError> {
        self.backend.set(TOKEN_KEY, token)
    }

    pub fn read(&self) -> Result<Option<String>, StorageError> {
        self.backend.get(TOKEN_KEY)
    }

    /// Remove both the token and its expiry record
    pub fn clear(&self) -> Result<(), StorageError> {
        debug!("Clearing stored session token");
        self.backend.remove(TOKEN_KEY)?;
        self.backend.remove(TOKEN_EXP_KEY)
    }

    pub fn save_expiry(&self, exp: i64) -> Result<(), StorageError> {
        self.backend.set(TOKEN_EXP_KEY, &exp.to_string())
    }

    /// Raw expiry record as persisted; parsing is left to the reader
    pub fn read_expiry(&self) -> Result<Option<String>, StorageError> {
        self.backend.get(TOKEN_EXP_KEY)
    }

    pub fn clear_expiry(&self) -> Result<(), StorageError> {
        self.backend.remove(TOKEN_EXP_KEY)
    }
}
