//! Small file-backed key/value store.
//!
//! Values are arbitrary JSON, kept in a single `kvdb.json` in the cache
//! directory. Every write rewrites the whole file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Store file name in cache directory
const KVDB_FILE: &str = "kvdb.json";

#[derive(Debug, Error)]
pub enum KvError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid value: {0}")]
    Json(#[from] serde_json::Error),
}

pub struct KvStore {
    path: Option<PathBuf>,
    entries: Mutex<BTreeMap<String, Value>>,
}

impl KvStore {
    /// Open (or create) the store in `cache_dir`.
    ///
    /// A corrupt file is logged and treated as empty; it is overwritten by
    /// the next write.
    pub fn open(cache_dir: &Path) -> Result<Self, KvError> {
        let path = cache_dir.join(KVDB_FILE);
        let entries = if path.exists() {
            let contents = std::fs::read_to_string(&path).map_err(|source| KvError::Read {
                path: path.clone(),
                source,
            })?;
            match serde_json::from_str(&contents) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Ignoring corrupt key/value store");
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };

        debug!(path = %path.display(), keys = entries.len(), "Opened key/value store");
        Ok(Self {
            path: Some(path),
            entries: Mutex::new(entries),
        })
    }

    /// A store that is never written to disk
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    /// Read `key`. A missing key or a value of another shape yields `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entries = self.entries.lock();
        let value = entries.get(key)?;
        match serde_json::from_value(value.clone()) {
            Ok(v) => Some(v),
            Err(e) => {
                debug!(key, error = %e, "Unexpected value shape");
                None
            }
        }
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), KvError> {
        let value = serde_json::to_value(value)?;
        let mut entries = self.entries.lock();
        entries.insert(key.to_string(), value);
        self.persist(&entries)
    }

    pub fn delete(&self, key: &str) -> Result<(), KvError> {
        let mut entries = self.entries.lock();
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.persist(&entries)
    }

    fn persist(&self, entries: &BTreeMap<String, Value>) -> Result<(), KvError> {
        let Some(ref path) = self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| KvError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let contents = serde_json::to_string_pretty(entries)?;
        std::fs::write(path, contents).map_err(|source| KvError::Write {
            path: path.clone(),
            source,
        })
    }
}
