//! In-memory key-value store.
//!
//! Shares nothing across processes, so the persisted half of the refresh
//! lock is only visible to clones of the same store. Suitable for tests and
//! for embedding without a file system.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::traits::{KeyValueStore, StoreError};

/// In-memory [`KeyValueStore`] with switchable failures.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
    /// Whether get should fail
    read_should_fail: Arc<Mutex<bool>>,
    /// Whether set and remove should fail
    write_should_fail: Arc<Mutex<bool>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with initial entries.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let store = Self::new();
        {
            let mut map = store.entries.lock().unwrap();
            for (key, value) in entries {
                map.insert(key.into(), value.into());
            }
        }
        store
    }

    /// Configure whether reads should fail.
    pub fn set_should_fail_read(&self, should_fail: bool) {
        *self.read_should_fail.lock().unwrap() = should_fail;
    }

    /// Configure whether writes and removals should fail.
    pub fn set_should_fail_write(&self, should_fail: bool) {
        *self.write_should_fail.lock().unwrap() = should_fail;
    }

    /// Snapshot of every entry.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.entries.lock().unwrap().clone()
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        if *self.read_should_fail.lock().unwrap() {
            return Err(StoreError::ReadFailed {
                key: key.to_string(),
                message: "Mock read failure".to_string(),
            });
        }
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if *self.write_should_fail.lock().unwrap() {
            return Err(StoreError::WriteFailed {
                key: key.to_string(),
                message: "Mock write failure".to_string(),
            });
        }
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        if *self.write_should_fail.lock().unwrap() {
            return Err(StoreError::RemoveFailed {
                key: key.to_string(),
                message: "Mock remove failure".to_string(),
            });
        }
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}
