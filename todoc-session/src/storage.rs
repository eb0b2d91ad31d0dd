use crate::error::SessionError;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
pub const ONBOARDING_COMPLETED_KEY: &str = "onboarding_completed";
pub const SELECTED_KID_KEY: &str = "selected_kid_id";

/// Client-side string storage that survives process restarts
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError>;

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError>;

    /// Removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<(), SessionError>;
}

/// Key-value storage backed by a single JSON object on disk
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within the process
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open the default store at `<data dir>/todoc/storage.json`
    pub fn new() -> Result<Self, SessionError> {
        let data_dir = Self::get_data_dir()?;
        Self::open(data_dir.join("storage.json"))
    }

    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    SessionError::Storage(format!("Failed to create storage directory: {}", e))
                })?;
            }
        }

        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn get_data_dir() -> Result<PathBuf, SessionError> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| SessionError::Configuration("Could not find data directory".into()))?
            .join("todoc");
        Ok(data_dir)
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, SessionError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let json = fs::read_to_string(&self.path)
            .map_err(|e| SessionError::Storage(format!("Failed to read storage: {}", e)))?;

        if json.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        match serde_json::from_str(&json) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                tracing::warn!(
                    "Storage file {} is unreadable ({}), starting empty",
                    self.path.display(),
                    e
                );
                self.set_aside();
                Ok(BTreeMap::new())
            }
        }
    }

    /// Move an unreadable file to `<name>.corrupt` so the next write starts
    /// from a clean slate
    fn set_aside(&self) {
        let mut aside = self.path.clone().into_os_string();
        aside.push(".corrupt");
        if let Err(e) = fs::rename(&self.path, &aside) {
            tracing::warn!("Failed to move unreadable storage aside: {}", e);
        }
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), SessionError> {
        let json = serde_json::to_string_pretty(entries)?;

        fs::write(&self.path, json)
            .map_err(|e| SessionError::Storage(format!("Failed to write storage: {}", e)))?;

        // Tokens live in here, keep the file owner-only
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&self.path)
                .map_err(|e| {
                    SessionError::Storage(format!("Failed to get file permissions: {}", e))
                })?
                .permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&self.path, perms).map_err(|e| {
                SessionError::Storage(format!("Failed to set file permissions: {}", e))
            })?;
        }

        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_entries()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.read_entries()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.read_entries()?;
        if entries.remove(key).is_some() {
            self.write_entries(&entries)?;
        }
        Ok(())
    }
}

/// In-process storage; clones share the same entries
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}
