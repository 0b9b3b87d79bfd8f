//! Multi-backend token store for non-browser clients.
//!
//! One logical token is mirrored into an ordered list of storage backends
//! (typically cookie jar, session-scoped memory, persistent file). Reads
//! walk the list in order and return the first hit; writes and deletes go
//! to every backend, and a failure in one is logged without stopping the
//! others.

use dashmap::DashMap;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

/// Pluggable token storage.
pub trait TokenBackend: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    fn delete(&self, key: &str) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage contents corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// A token mirrored across backends in read-priority order.
pub struct SyncedTokenStore {
    key: String,
    backends: Vec<Box<dyn TokenBackend>>,
}

impl SyncedTokenStore {
    pub fn new(key: impl Into<String>, backends: Vec<Box<dyn TokenBackend>>) -> Self {
        Self {
            key: key.into(),
            backends,
        }
    }

    /// Write the token to every backend.
    ///
    /// A backend that rejects the write has its stale copy removed, so reads
    /// fall through to one holding the new value. Returns how many backends
    /// accepted the write.
    pub fn set_token(&self, value: &str) -> usize {
        let mut written = 0;
        for backend in &self.backends {
            match backend.set(&self.key, value) {
                Ok(()) => written += 1,
                Err(e) => {
                    tracing::warn!(backend = backend.name(), "Token write failed: {}", e);
                    if let Err(e) = backend.delete(&self.key) {
                        tracing::warn!(
                            backend = backend.name(),
                            "Stale token left in place: {}",
                            e
                        );
                    }
                }
            }
        }
        written
    }

    /// First non-empty token in backend order.
    pub fn get_token(&self) -> Option<String> {
        for backend in &self.backends {
            match backend.get(&self.key) {
                Ok(Some(value)) if !value.is_empty() => return Some(value),
                Ok(_) => {}
                Err(e) => tracing::warn!(
                    backend = backend.name(),
                    "Token read failed: {}",
                    e
                ),
            }
        }
        None
    }

    /// Remove the token from every backend.
    pub fn delete_token(&self) {
        for backend in &self.backends {
            if let Err(e) = backend.delete(&self.key) {
                tracing::warn!(backend = backend.name(), "Token delete failed: {}", e);
            }
        }
    }

    pub fn has_token(&self) -> bool {
        self.get_token().is_some()
    }
}

/// In-process storage: stands in for a cookie jar or session-scoped storage.
pub struct MemoryBackend {
    name: String,
    store: DashMap<String, String>,
}

impl MemoryBackend {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            store: DashMap::new(),
        }
    }
}

impl TokenBackend for MemoryBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.store.get(key).map(|v| v.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.store.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.store.remove(key);
        Ok(())
    }
}

/// Persistent storage: a JSON object of key → token in a single file.
pub struct FileBackend {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn load(&self) -> Result<HashMap<String, String>, StoreError> {
        match std::fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(HashMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn persist(&self, entries: &HashMap<String, String>) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(entries)?;
        std::fs::write(&self.path, bytes)?;
        Ok(())
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, ()>, StoreError> {
        self.lock
            .lock()
            .map_err(|_| StoreError::Unavailable("file lock poisoned".into()))
    }
}

impl TokenBackend for FileBackend {
    fn name(&self) -> &str {
        "file"
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.guard()?;
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.guard()?;
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.guard()?;
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }
}
