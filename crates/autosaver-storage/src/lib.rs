//! Preference storage for autosaver.
//!
//! Settings are kept in a flat key/value store, addressed by dotted keys such
//! as `AutoSaver.Interval`. Two backends are provided:
//! - JSON file storage (one object per file, written atomically)
//! - In-memory storage (for testing and embedding)

pub mod error;
pub mod json;
pub mod memory;

pub use error::{StorageError, StorageResult};
pub use json::JsonPrefStore;
pub use memory::MemoryPrefStore;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

/// A trait for key/value preference backends.
///
/// Values are serialized as JSON. A missing key reads as `None`.
#[async_trait]
pub trait PrefStore: Send + Sync {
    /// Read a value.
    ///
    /// Returns `Err(StorageError::Json)` if the stored value has a different type.
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> StorageResult<Option<T>>;

    /// Write a value, persisting it before returning.
    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T) -> StorageResult<()>;

    /// Remove a value. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> StorageResult<()>;

    /// Check if a key exists.
    async fn contains(&self, key: &str) -> StorageResult<bool>;
}

/// Reject keys that cannot be stored.
pub(crate) fn validate_key(key: &str) -> StorageResult<()> {
    if key.trim().is_empty() {
        return Err(StorageError::invalid_key("Key cannot be empty"));
    }
    if key.chars().any(char::is_control) {
        return Err(StorageError::invalid_key(format!(
            "Key contains control characters: {key:?}"
        )));
    }
    Ok(())
}
