//! In-memory preference storage.

use crate::{validate_key, PrefStore, StorageError, StorageResult};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory preference store.
///
/// Nothing is written to disk; useful for tests and hosts that own
/// persistence themselves.
#[derive(Default)]
pub struct MemoryPrefStore {
    data: RwLock<HashMap<String, Value>>,
}

impl MemoryPrefStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with raw JSON values.
    pub fn with_values<I, K>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            data: RwLock::new(values.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.data.read().map(|d| d.len()).unwrap_or(0)
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl PrefStore for MemoryPrefStore {
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> StorageResult<Option<T>> {
        validate_key(key)?;
        let data = self
            .data
            .read()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;

        match data.get(key) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T) -> StorageResult<()> {
        validate_key(key)?;
        let value = serde_json::to_value(value)?;

        let mut data = self
            .data
            .write()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;
        data.insert(key.to_string(), value);

        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        let mut data = self
            .data
            .write()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;
        data.remove(key);
        Ok(())
    }

    async fn contains(&self, key: &str) -> StorageResult<bool> {
        validate_key(key)?;
        let data = self
            .data
            .read()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;
        Ok(data.contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryPrefStore::new();
        assert!(store.is_empty());

        store.set("AutoSaver.MaxFiles", &10).await.unwrap();
        let value: Option<i64> = store.get("AutoSaver.MaxFiles").await.unwrap();
        assert_eq!(value, Some(10));
        assert_eq!(store.len(), 1);

        store.remove("AutoSaver.MaxFiles").await.unwrap();
        assert!(!store.contains("AutoSaver.MaxFiles").await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_store_with_values() {
        let store = MemoryPrefStore::with_values([
            ("AutoSaver.Enabled", json!(false)),
            ("AutoSaver.Interval", json!(0.5)),
        ]);

        let enabled: Option<bool> = store.get("AutoSaver.Enabled").await.unwrap();
        let interval: Option<f64> = store.get("AutoSaver.Interval").await.unwrap();
        assert_eq!(enabled, Some(false));
        assert_eq!(interval, Some(0.5));
    }

    #[tokio::test]
    async fn test_memory_store_overwrite() {
        let store = MemoryPrefStore::new();
        store.set("AutoSaver.Path", &"first").await.unwrap();
        store.set("AutoSaver.Path", &"second").await.unwrap();

        let value: Option<String> = store.get("AutoSaver.Path").await.unwrap();
        assert_eq!(value.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_memory_store_type_mismatch() {
        let store = MemoryPrefStore::with_values([("AutoSaver.MaxFiles", json!("ten"))]);
        let result: StorageResult<Option<i64>> = store.get("AutoSaver.MaxFiles").await;
        assert!(matches!(result, Err(StorageError::Json(_))));
    }

    #[tokio::test]
    async fn test_memory_store_rejects_empty_key() {
        let store = MemoryPrefStore::new();
        assert!(matches!(
            store.set("  ", &true).await,
            Err(StorageError::InvalidKey(_))
        ));
    }
}
