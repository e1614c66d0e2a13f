//! Autosave configuration and its preference-store adapter.
//!
//! Four values are persisted:
//!
//! | key                 | type          | default      |
//! |---------------------|---------------|--------------|
//! | `AutoSaver.Enabled`  | bool          | `true`       |
//! | `AutoSaver.Interval` | float minutes | `5.0`        |
//! | `AutoSaver.Path`     | string        | `"AutoSave"` |
//! | `AutoSaver.MaxFiles` | int           | `10`         |
//!
//! Setters clamp before persisting and write through immediately.

use crate::CoreResult;
use autosaver_storage::PrefStore;
use autosaver_util::path::resolve_in_project;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Preference keys.
pub mod keys {
    pub const ENABLED: &str = "AutoSaver.Enabled";
    pub const INTERVAL: &str = "AutoSaver.Interval";
    pub const PATH: &str = "AutoSaver.Path";
    pub const MAX_FILES: &str = "AutoSaver.MaxFiles";
}

pub const DEFAULT_INTERVAL_MINUTES: f64 = 5.0;
pub const MIN_INTERVAL_MINUTES: f64 = 0.1;
pub const DEFAULT_MAX_SNAPSHOTS: u32 = 10;
pub const MIN_MAX_SNAPSHOTS: u32 = 1;
pub const DEFAULT_DIRECTORY: &str = "AutoSave";

/// Autosave settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutosaveConfig {
    pub enabled: bool,
    /// Minutes between automatic snapshots, at least [`MIN_INTERVAL_MINUTES`].
    pub interval_minutes: f64,
    /// Snapshot directory as configured; relative paths are project-relative.
    pub directory: PathBuf,
    /// Retention cap, at least [`MIN_MAX_SNAPSHOTS`].
    pub max_snapshots: u32,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_minutes: DEFAULT_INTERVAL_MINUTES,
            directory: PathBuf::from(DEFAULT_DIRECTORY),
            max_snapshots: DEFAULT_MAX_SNAPSHOTS,
        }
    }
}

impl AutosaveConfig {
    /// Interval between automatic snapshots. Saturates at [`Duration::MAX`].
    pub fn interval(&self) -> Duration {
        Duration::try_from_secs_f64(clamp_interval(self.interval_minutes) * 60.0)
            .unwrap_or(Duration::MAX)
    }

    /// Absolute snapshot directory for a project.
    pub fn resolved_directory(&self, project_root: &Path) -> PathBuf {
        resolve_in_project(project_root, &self.directory)
    }
}

/// Clamp an interval to the supported range. Non-finite input maps to the minimum.
pub fn clamp_interval(minutes: f64) -> f64 {
    if minutes.is_finite() {
        minutes.max(MIN_INTERVAL_MINUTES)
    } else {
        MIN_INTERVAL_MINUTES
    }
}

/// Clamp a retention cap to at least one snapshot.
pub fn clamp_max_snapshots(max: i64) -> u32 {
    max.clamp(MIN_MAX_SNAPSHOTS as i64, u32::MAX as i64) as u32
}

/// Typed access to [`AutosaveConfig`] backed by a [`PrefStore`].
pub struct Settings<S> {
    store: S,
    project_root: PathBuf,
    config: AutosaveConfig,
}

impl<S: PrefStore> Settings<S> {
    /// Load settings once. Missing or unreadable values fall back to defaults.
    pub async fn load(store: S, project_root: impl Into<PathBuf>) -> Self {
        let defaults = AutosaveConfig::default();

        let enabled = read_or(&store, keys::ENABLED, defaults.enabled).await;
        let interval: f64 = read_or(&store, keys::INTERVAL, defaults.interval_minutes).await;
        let directory: String = read_or(
            &store,
            keys::PATH,
            defaults.directory.to_string_lossy().into_owned(),
        )
        .await;
        let max: i64 = read_or(&store, keys::MAX_FILES, defaults.max_snapshots as i64).await;

        let config = AutosaveConfig {
            enabled,
            interval_minutes: clamp_interval(interval),
            directory: if directory.trim().is_empty() {
                defaults.directory
            } else {
                PathBuf::from(directory)
            },
            max_snapshots: clamp_max_snapshots(max),
        };
        debug!(?config, "Loaded autosave settings");

        Self {
            store,
            project_root: project_root.into(),
            config,
        }
    }

    pub fn config(&self) -> &AutosaveConfig {
        &self.config
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Absolute snapshot directory.
    pub fn directory(&self) -> PathBuf {
        self.config.resolved_directory(&self.project_root)
    }

    pub async fn set_enabled(&mut self, enabled: bool) -> CoreResult<()> {
        self.config.enabled = enabled;
        self.persist(keys::ENABLED, &enabled).await
    }

    /// Flip `enabled` and return the new value.
    pub async fn toggle(&mut self) -> CoreResult<bool> {
        let enabled = !self.config.enabled;
        self.set_enabled(enabled).await?;
        Ok(enabled)
    }

    pub async fn set_interval_minutes(&mut self, minutes: f64) -> CoreResult<()> {
        let minutes = clamp_interval(minutes);
        self.config.interval_minutes = minutes;
        self.persist(keys::INTERVAL, &minutes).await
    }

    pub async fn set_directory(&mut self, directory: impl Into<PathBuf>) -> CoreResult<()> {
        let directory = directory.into();
        let stored = directory.to_string_lossy().into_owned();
        self.config.directory = directory;
        self.persist(keys::PATH, &stored).await
    }

    /// Set the retention cap. Zero and negative values clamp to one.
    pub async fn set_max_snapshots(&mut self, max: i64) -> CoreResult<()> {
        let max = clamp_max_snapshots(max);
        self.config.max_snapshots = max;
        self.persist(keys::MAX_FILES, &(max as i64)).await
    }

    /// Write every field. Called on shutdown.
    pub async fn persist_all(&self) -> CoreResult<()> {
        let config = &self.config;
        self.persist(keys::ENABLED, &config.enabled).await?;
        self.persist(keys::INTERVAL, &config.interval_minutes).await?;
        self.persist(keys::PATH, &config.directory.to_string_lossy().into_owned())
            .await?;
        self.persist(keys::MAX_FILES, &(config.max_snapshots as i64))
            .await
    }

    async fn persist<T: Serialize + Send + Sync>(&self, key: &str, value: &T) -> CoreResult<()> {
        self.store.set(key, value).await.map_err(|e| {
            warn!(key, error = %e, "Failed to persist autosave setting");
            e.into()
        })
    }
}

async fn read_or<S, T>(store: &S, key: &str, default: T) -> T
where
    S: PrefStore,
    T: DeserializeOwned + Send,
{
    match store.get::<T>(key).await {
        Ok(Some(value)) => value,
        Ok(None) => default,
        Err(e) => {
            warn!(key, error = %e, "Ignoring unreadable autosave setting");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autosaver_storage::{MemoryPrefStore, StorageError, StorageResult};
    use serde_json::json;

    #[test]
    fn test_clamp_interval() {
        assert_eq!(clamp_interval(5.0), 5.0);
        assert_eq!(clamp_interval(0.01), MIN_INTERVAL_MINUTES);
        assert_eq!(clamp_interval(-3.0), MIN_INTERVAL_MINUTES);
        assert_eq!(clamp_interval(f64::NAN), MIN_INTERVAL_MINUTES);
    }

    #[test]
    fn test_clamp_max_snapshots() {
        assert_eq!(clamp_max_snapshots(0), 1);
        assert_eq!(clamp_max_snapshots(-5), 1);
        assert_eq!(clamp_max_snapshots(7), 7);
        assert_eq!(clamp_max_snapshots(i64::MAX), u32::MAX);
    }

    #[test]
    fn test_interval_duration() {
        let config = AutosaveConfig::default();
        assert_eq!(config.interval(), Duration::from_secs(300));
    }

    #[test]
    fn test_interval_saturates_instead_of_overflowing() {
        let config = AutosaveConfig {
            interval_minutes: 1e300,
            ..AutosaveConfig::default()
        };
        assert_eq!(config.interval(), Duration::MAX);

        let config = AutosaveConfig {
            interval_minutes: f64::INFINITY,
            ..AutosaveConfig::default()
        };
        assert_eq!(config.interval(), Duration::from_secs(6));
    }

    #[tokio::test]
    async fn test_load_defaults() {
        let settings = Settings::load(MemoryPrefStore::new(), "/work/game").await;
        assert_eq!(settings.config(), &AutosaveConfig::default());
        assert_eq!(settings.directory(), PathBuf::from("/work/game/AutoSave"));
    }

    #[tokio::test]
    async fn test_load_clamps_and_ignores_bad_types() {
        let store = MemoryPrefStore::with_values([
            (keys::ENABLED, json!("definitely")),
            (keys::INTERVAL, json!(0.0)),
            (keys::PATH, json!("Backups/Scenes")),
            (keys::MAX_FILES, json!(-2)),
        ]);
        let settings = Settings::load(store, "/work/game").await;
        let config = settings.config();

        assert!(config.enabled);
        assert_eq!(config.interval_minutes, MIN_INTERVAL_MINUTES);
        assert_eq!(config.max_snapshots, 1);
        assert_eq!(
            settings.directory(),
            PathBuf::from("/work/game/Backups/Scenes")
        );
    }

    #[tokio::test]
    async fn test_setters_persist_clamped_values() {
        let mut settings = Settings::load(MemoryPrefStore::new(), "/work/game").await;

        settings.set_max_snapshots(0).await.unwrap();
        settings.set_interval_minutes(0.05).await.unwrap();
        settings.set_directory("/tmp/snaps").await.unwrap();

        let store = settings.store();
        assert_eq!(store.get::<i64>(keys::MAX_FILES).await.unwrap(), Some(1));
        assert_eq!(
            store.get::<f64>(keys::INTERVAL).await.unwrap(),
            Some(MIN_INTERVAL_MINUTES)
        );
        assert_eq!(
            store.get::<String>(keys::PATH).await.unwrap().as_deref(),
            Some("/tmp/snaps")
        );
        assert_eq!(settings.directory(), PathBuf::from("/tmp/snaps"));
    }

    #[tokio::test]
    async fn test_toggle_flips_and_persists() {
        let mut settings = Settings::load(MemoryPrefStore::new(), "/work/game").await;

        assert!(!settings.toggle().await.unwrap());
        assert_eq!(
            settings.store().get::<bool>(keys::ENABLED).await.unwrap(),
            Some(false)
        );
        assert!(settings.toggle().await.unwrap());
    }

    struct ReadOnlyStore;

    #[async_trait::async_trait]
    impl PrefStore for ReadOnlyStore {
        async fn get<T: DeserializeOwned + Send>(&self, _key: &str) -> StorageResult<Option<T>> {
            Ok(None)
        }

        async fn set<T: Serialize + Send + Sync>(&self, _key: &str, _value: &T) -> StorageResult<()> {
            Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )))
        }

        async fn remove(&self, _key: &str) -> StorageResult<()> {
            Ok(())
        }

        async fn contains(&self, _key: &str) -> StorageResult<bool> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn test_failed_persist_keeps_in_memory_value() {
        let mut settings = Settings::load(ReadOnlyStore, "/work/game").await;

        assert!(settings.set_max_snapshots(3).await.is_err());
        assert_eq!(settings.config().max_snapshots, 3);
    }
}
