//! File-backed key-value store.
//!
//! One file per key inside a directory. Every process pointing at the same
//! directory sees the same entries, which is what makes the refresh lock
//! work across sessions. Writes go to a temp file first and are renamed
//! into place, so readers never observe a half-written value.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::traits::{KeyValueStore, StoreError};

/// Directory under the home directory used by default.
const STORE_DIR: &str = ".flowlink/session";

/// [`KeyValueStore`] persisting each entry as a file.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store at `~/.flowlink/session`.
    pub fn default_location() -> Result<Self, StoreError> {
        Self::default_dir()
            .map(Self::new)
            .ok_or_else(|| StoreError::Unavailable("Failed to determine home directory".to_string()))
    }

    /// Default store directory, `None` when there is no home directory.
    pub fn default_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(STORE_DIR))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys are percent-encoded so any key maps to a single plain file name
        self.dir.join(urlencoding::encode(key).as_ref())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::ReadFailed {
                key: key.to_string(),
                message: e.to_string(),
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let write_failed = |e: std::io::Error| StoreError::WriteFailed {
            key: key.to_string(),
            message: e.to_string(),
        };

        std::fs::create_dir_all(&self.dir).map_err(write_failed)?;

        // Every write gets its own temp file; it is deleted if persisting fails
        let mut temp = tempfile::Builder::new()
            .prefix(".write-")
            .suffix(".tmp")
            .tempfile_in(&self.dir)
            .map_err(write_failed)?;
        temp.write_all(value.as_bytes()).map_err(write_failed)?;
        temp.persist(self.path_for(key)).map_err(|e| write_failed(e.error))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::RemoveFailed {
                key: key.to_string(),
                message: e.to_string(),
            }),
        }
    }
}
