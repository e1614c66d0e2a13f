//! JSON file-based preference storage.
//!
//! All keys live in a single JSON object, e.g. `.autosaver/prefs.json`:
//! `{"AutoSaver.Enabled": true, "AutoSaver.Interval": 5.0}`.
//! The file is loaded lazily on first access and rewritten on every `set`.

use crate::{validate_key, PrefStore, StorageError, StorageResult};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

/// JSON file-based preference store.
pub struct JsonPrefStore {
    path: PathBuf,
    /// Cached contents; `None` until first loaded.
    cache: Mutex<Option<Map<String, Value>>>,
}

impl JsonPrefStore {
    /// Create a store backed by the file at `path`. The file need not exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(None),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> StorageResult<Map<String, Value>> {
        debug!(path = %self.path.display(), "Loading preferences");

        match fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(Map::new()),
            Ok(content) => match serde_json::from_str::<Value>(&content)? {
                Value::Object(map) => Ok(map),
                other => Err(StorageError::Corrupt(format!(
                    "{} holds {} instead of an object",
                    self.path.display(),
                    json_kind(&other)
                ))),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn persist(&self, map: &Map<String, Value>) -> StorageResult<()> {
        debug!(path = %self.path.display(), "Writing preferences");

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let content = serde_json::to_string_pretty(map)?;

        // Write atomically (write to temp file, then rename)
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, &content).await?;
        fs::rename(&temp_path, &self.path).await?;

        Ok(())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[async_trait]
impl PrefStore for JsonPrefStore {
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> StorageResult<Option<T>> {
        validate_key(key)?;
        let mut cache = self.cache.lock().await;
        if cache.is_none() {
            *cache = Some(self.load().await?);
        }

        match cache.as_ref().and_then(|map| map.get(key)) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T) -> StorageResult<()> {
        validate_key(key)?;
        let value = serde_json::to_value(value)?;

        let mut cache = self.cache.lock().await;
        let mut map = match cache.take() {
            Some(map) => map,
            None => self.load().await?,
        };
        map.insert(key.to_string(), value);

        let result = self.persist(&map).await;
        *cache = Some(map);
        result
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        let mut cache = self.cache.lock().await;
        let mut map = match cache.take() {
            Some(map) => map,
            None => self.load().await?,
        };

        let result = if map.remove(key).is_some() {
            self.persist(&map).await
        } else {
            Ok(())
        };
        *cache = Some(map);
        result
    }

    async fn contains(&self, key: &str) -> StorageResult<bool> {
        validate_key(key)?;
        let mut cache = self.cache.lock().await;
        if cache.is_none() {
            *cache = Some(self.load().await?);
        }
        Ok(cache.as_ref().is_some_and(|map| map.contains_key(key)))
    }
}
