//! # Session Storage
//!
//! Persisted key/value storage that backs the client session.
//!
//! Values are plain strings keyed by name, the same shape a browser's local
//! storage offers. Two implementations are provided:
//!
//! - [`FileStore`] - a flat JSON object on disk, used by the CLI
//! - [`MemoryStore`] - process-local storage, used by tests and embedders
//!
//! Writes are last-write-wins. [`SessionStore::apply`] groups several changes
//! into a single write so that related keys change together.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use log::{debug, warn};
use thiserror::Error;

/// Errors raised by a session store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store cannot be used at all (no home directory, poisoned lock, etc.)
    #[error("Session storage unavailable: {message}")]
    Unavailable {
        /// Human-readable error message
        message: String,
    },

    /// Reading or writing the backing file failed.
    #[error("Session storage I/O error at {}: {source}", .path.display())]
    Io {
        /// Path of the backing file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The backing file exists but does not contain a JSON object of strings.
    #[error("Session storage at {} is corrupted: {source}", .path.display())]
    Corrupted {
        /// Path of the backing file
        path: PathBuf,
        /// Underlying parse error
        #[source]
        source: serde_json::Error,
    },
}

/// A persisted string key/value store.
///
/// Implementations must be safe to share between concurrently running
/// requests.
pub trait SessionStore: Send + Sync {
    /// Read a value. Missing keys yield `Ok(None)`.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a value. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Apply several changes as one write. A `None` value removes the key.
    fn apply(&self, changes: &[(&str, Option<&str>)]) -> Result<(), StoreError> {
        for (key, value) in changes {
            match value {
                Some(value) => self.set(key, value)?,
                None => self.remove(key)?,
            }
        }
        Ok(())
    }
}

/// In-process session storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> StoreError {
        StoreError::Unavailable {
            message: "memory store lock poisoned".to_string(),
        }
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.read().map_err(|_| Self::poisoned())?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;
        entries.remove(key);
        Ok(())
    }

    fn apply(&self, changes: &[(&str, Option<&str>)]) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;
        apply_changes(&mut entries, changes);
        Ok(())
    }
}

/// Session storage persisted as a JSON object in a single file.
///
/// Every write rewrites the whole file through a temporary sibling followed
/// by a rename, so readers never observe a half-written document.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    /// Create a store backed by `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Create a store at the default location
    /// (`~/.config/portal/session.json`).
    pub fn default_location() -> Result<Self, StoreError> {
        let path = crate::config::session_path().map_err(|e| StoreError::Unavailable {
            message: e.to_string(),
        })?;
        Ok(Self::new(path))
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&contents).map_err(|source| StoreError::Corrupted {
            path: self.path.clone(),
            source,
        })
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let io_error = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }

        let contents = serde_json::to_string_pretty(entries).map_err(|source| {
            StoreError::Corrupted {
                path: self.path.clone(),
                source,
            }
        })?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, contents).map_err(io_error)?;
        fs::rename(&tmp_path, &self.path).map_err(io_error)?;
        debug!("Wrote session store {}", self.path.display());
        Ok(())
    }

    /// Run a read-modify-write cycle while holding the in-process lock.
    ///
    /// A corrupted document is discarded and rewritten from the changes, so
    /// clearing the session always works.
    fn update<F>(&self, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _guard = self.lock.lock().map_err(|_| StoreError::Unavailable {
            message: "file store lock poisoned".to_string(),
        })?;
        let (mut entries, corrupted) = match self.read_all() {
            Ok(entries) => (entries, false),
            Err(e @ StoreError::Corrupted { .. }) => {
                warn!("Discarding unreadable session store: {}", e);
                (BTreeMap::new(), true)
            }
            Err(e) => return Err(e),
        };
        let before = entries.clone();
        f(&mut entries);
        if !corrupted && entries == before && self.path.exists() {
            return Ok(());
        }
        self.write_all(&entries)
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Unavailable {
            message: "file store lock poisoned".to_string(),
        })?;
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.update(|entries| {
            entries.remove(key);
        })
    }

    fn apply(&self, changes: &[(&str, Option<&str>)]) -> Result<(), StoreError> {
        self.update(|entries| apply_changes(entries, changes))
    }
}

fn apply_changes(entries: &mut BTreeMap<String, String>, changes: &[(&str, Option<&str>)]) {
    for (key, value) in changes {
        match value {
            Some(value) => {
                entries.insert((*key).to_string(), (*value).to_string());
            }
            None => {
                entries.remove(*key);
            }
        }
    }
}
