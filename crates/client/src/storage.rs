//! Durable key-value storage for session state.
//!
//! The session layer only needs synchronous string get/set/remove. Two
//! backends are provided: an in-memory map and a single JSON document on
//! disk that survives process restarts.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Synchronous string key-value storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Storage error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(String),
    #[error("storage serialization failed: {0}")]
    Serialize(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory store. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store, e.g. with data written by an earlier session.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            entries: Arc::new(RwLock::new(map)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File-backed
// ─────────────────────────────────────────────────────────────────────────────

/// On-disk layout of a [`FileStore`].
#[derive(Debug, Serialize, Deserialize)]
struct StoreDocument {
    entries: BTreeMap<String, String>,
    updated_at: DateTime<Utc>,
}

/// JSON-document store.
///
/// The whole document is loaded once at open and rewritten on every
/// mutation (temp file + rename, so readers never observe a torn file).
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    /// File name used inside a state directory.
    pub const FILE_NAME: &'static str = "session.json";

    /// Open (or create) the store at `path`.
    ///
    /// A missing file is an empty store. An unreadable or corrupt document
    /// is logged and replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create state directory at {:?}", parent))?;
        }

        let entries = match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<StoreDocument>(&text) {
                Ok(doc) => doc.entries,
                Err(err) => {
                    tracing::warn!(path = %path.display(), "session file is corrupt, starting empty: {err}");
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                return Err(err).with_context(|| format!("failed to read session file at {:?}", path));
            }
        };

        tracing::debug!(path = %path.display(), entries = entries.len(), "opened session file");

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Open `{dir}/session.json`.
    pub fn open_in(dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        Self::open(dir.as_ref().join(Self::FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> anyhow::Result<()> {
        let doc = StoreDocument {
            entries: entries.clone(),
            updated_at: Utc::now(),
        };
        let payload = serde_json::to_vec_pretty(&doc).context("failed to serialize session document")?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, payload)
            .with_context(|| format!("failed to write temporary session file at {:?}", tmp))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to move session file into place at {:?}", self.path))?;

        Ok(())
    }

    fn mutate<F>(&self, change: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> bool,
    {
        // Holding the write lock across the flush keeps file order == call order.
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if !change(&mut entries) {
            return Ok(());
        }
        self.flush(&entries)
            .map_err(|err| StorageError::Io(format!("{err:#}")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.mutate(|entries| {
            let previous = entries.insert(key.to_string(), value.to_string());
            previous.as_deref() != Some(value)
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.mutate(|entries| entries.remove(key).is_some())
    }
}
