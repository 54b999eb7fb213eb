//! Persisted key-value store trait abstraction.
//!
//! Every process pointing at the same store shares its entries, which is
//! what makes the refresh lock visible across sessions.

/// Key-value store operation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// Failed to read an entry
    #[error("Failed to read '{key}': {message}")]
    ReadFailed { key: String, message: String },
    /// Failed to write an entry
    #[error("Failed to write '{key}': {message}")]
    WriteFailed { key: String, message: String },
    /// Failed to remove an entry
    #[error("Failed to remove '{key}': {message}")]
    RemoveFailed { key: String, message: String },
    /// Store location could not be determined
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Trait for plain string key-value storage.
///
/// Operations are synchronous so lock guards can release entries from
/// `Drop`.
pub trait KeyValueStore: Send + Sync {
    /// Read an entry. `Ok(None)` when the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write an entry, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove an entry. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}
