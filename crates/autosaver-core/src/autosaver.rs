//! The autosave context.
//!
//! [`Autosaver`] owns everything that changes at runtime: settings, the
//! scheduler's last-save time and the event publisher. Construct one at
//! startup, feed it ticks, and call [`Autosaver::shutdown`] on exit.

use crate::config::Settings;
use crate::scheduler::{AutosaveScheduler, Gate, SkipReason, TickOutcome};
use crate::{AutosaveConfig, AutosaveEvent, CoreError, CoreResult, EventPublisher};
use autosaver_snapshot::{
    Document, DocumentHost, PruneReport, RetentionPolicy, Snapshot, SnapshotFile, SnapshotKind,
    SnapshotResult, SnapshotWriter, WriterOptions, DEFAULT_SIDECAR_EXTENSION,
};
use autosaver_storage::PrefStore;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tokio::sync::broadcast;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Options that are not user settings.
#[derive(Debug, Clone)]
pub struct AutosaverOptions {
    pub writer: WriterOptions,
    /// Sidecar suffix deleted together with each pruned snapshot.
    pub sidecar_extension: Option<String>,
    /// Extension managed by `prune_now`/`list_snapshots` when no document is open.
    pub default_extension: String,
}

impl Default for AutosaverOptions {
    fn default() -> Self {
        Self {
            writer: WriterOptions::default(),
            sidecar_extension: Some(DEFAULT_SIDECAR_EXTENSION.to_string()),
            default_extension: "unity".to_string(),
        }
    }
}

struct State<S> {
    settings: Settings<S>,
    scheduler: AutosaveScheduler,
}

/// Autosave for a single active document.
///
/// All operations take `&self`; writes, prunes and setting changes are
/// serialized by one lock, so at most one snapshot is in flight.
pub struct Autosaver<H, S> {
    host: H,
    state: Mutex<State<S>>,
    options: AutosaverOptions,
    events: EventPublisher,
}

impl<H, S> Autosaver<H, S>
where
    H: DocumentHost,
    S: PrefStore,
{
    /// Load settings from `store` and start the first interval now.
    pub async fn load(
        host: H,
        store: S,
        project_root: impl Into<PathBuf>,
        options: AutosaverOptions,
    ) -> Self {
        let settings = Settings::load(store, project_root).await;
        info!(
            enabled = settings.config().enabled,
            interval_minutes = settings.config().interval_minutes,
            directory = %settings.directory().display(),
            max_snapshots = settings.config().max_snapshots,
            "Autosave ready"
        );

        Self {
            host,
            state: Mutex::new(State {
                settings,
                scheduler: AutosaveScheduler::new(Local::now()),
            }),
            options,
            events: EventPublisher::new(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Register a control surface for change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<AutosaveEvent> {
        self.events.subscribe()
    }

    pub async fn config(&self) -> AutosaveConfig {
        self.state.lock().await.settings.config().clone()
    }

    /// Absolute snapshot directory.
    pub async fn directory(&self) -> PathBuf {
        self.state.lock().await.settings.directory()
    }

    pub async fn last_snapshot_time(&self) -> DateTime<Local> {
        self.state.lock().await.scheduler.last_snapshot_time()
    }

    /// Restart the autosave interval from `at`.
    pub async fn reset_timer(&self, at: DateTime<Local>) {
        self.state.lock().await.scheduler.reset(at);
    }

    /// Handle one host tick.
    ///
    /// Returns once the snapshot (and prune, on success) has finished.
    pub async fn tick(&self, now: DateTime<Local>) -> TickOutcome {
        let mut state = self.state.lock().await;
        let config = state.settings.config().clone();

        if !config.enabled {
            return TickOutcome::Skipped(SkipReason::Disabled);
        }
        if !self.host.is_editable() {
            return TickOutcome::Skipped(SkipReason::NotEditable);
        }
        let Some(document) = self.named_document() else {
            return TickOutcome::Skipped(SkipReason::NoDocument);
        };

        if let Gate::NotDue(remaining) = state.scheduler.check(now, config.interval()) {
            return TickOutcome::NotDue { remaining };
        }

        let directory = state.settings.directory();
        match self
            .capture(&directory, &document, SnapshotKind::Auto, now)
            .await
        {
            Ok(snapshot) => {
                state.scheduler.record_success(now);
                self.prune(&directory, &snapshot.name.extension, config.max_snapshots)
                    .await;
                TickOutcome::Saved(snapshot)
            }
            Err(e) => TickOutcome::Failed(e),
        }
    }

    /// The manual "save now" action.
    pub async fn save_now(&self) -> CoreResult<Snapshot> {
        self.save_manual_at(Local::now()).await
    }

    /// Manual snapshot stamped `at`.
    ///
    /// Works while autosave is disabled and leaves the autosave timer alone.
    pub async fn save_manual_at(&self, at: DateTime<Local>) -> CoreResult<Snapshot> {
        let state = self.state.lock().await;
        let Some(document) = self.named_document() else {
            warn!("Manual save requested without an active document");
            return Err(CoreError::NoActiveDocument);
        };

        let config = state.settings.config();
        let directory = state.settings.directory();
        let snapshot = self
            .capture(&directory, &document, SnapshotKind::Manual, at)
            .await?;
        self.prune(&directory, &snapshot.name.extension, config.max_snapshots)
            .await;
        Ok(snapshot)
    }

    /// Run a retention pass outside the save cycle.
    pub async fn prune_now(&self) -> CoreResult<PruneReport> {
        let state = self.state.lock().await;
        let directory = state.settings.directory();
        let report = self
            .retention(&self.managed_extension())
            .prune(&directory, state.settings.config().max_snapshots)
            .await?;
        self.publish_pruned(&report);
        Ok(report)
    }

    /// Managed snapshots, newest first.
    pub async fn list_snapshots(&self) -> CoreResult<Vec<SnapshotFile>> {
        let directory = self.directory().await;
        Ok(self
            .retention(&self.managed_extension())
            .list(&directory)
            .await?)
    }

    pub async fn set_enabled(&self, enabled: bool) -> CoreResult<()> {
        let mut state = self.state.lock().await;
        let result = state.settings.set_enabled(enabled).await;
        self.config_changed(&state.settings);
        result
    }

    /// Flip autosave on/off and return the new state.
    pub async fn toggle(&self) -> CoreResult<bool> {
        let mut state = self.state.lock().await;
        let result = state.settings.toggle().await;
        self.config_changed(&state.settings);
        if let Ok(enabled) = result {
            info!(enabled, "Autosave toggled");
        }
        result
    }

    pub async fn set_interval_minutes(&self, minutes: f64) -> CoreResult<()> {
        let mut state = self.state.lock().await;
        let result = state.settings.set_interval_minutes(minutes).await;
        self.config_changed(&state.settings);
        result
    }

    pub async fn set_directory(&self, directory: impl Into<PathBuf>) -> CoreResult<()> {
        let mut state = self.state.lock().await;
        let result = state.settings.set_directory(directory).await;
        self.config_changed(&state.settings);
        result
    }

    pub async fn set_max_snapshots(&self, max: i64) -> CoreResult<()> {
        let mut state = self.state.lock().await;
        let result = state.settings.set_max_snapshots(max).await;
        self.config_changed(&state.settings);
        result
    }

    /// Final persist of all settings.
    pub async fn shutdown(&self) -> CoreResult<()> {
        let state = self.state.lock().await;
        state.settings.persist_all().await?;
        debug!("Autosave settings persisted on shutdown");
        Ok(())
    }

    fn named_document(&self) -> Option<Document> {
        self.host.active_document().filter(Document::is_named)
    }

    fn managed_extension(&self) -> String {
        self.host
            .active_document()
            .map(|d| d.extension)
            .filter(|ext| !ext.is_empty())
            .unwrap_or_else(|| self.options.default_extension.clone())
    }

    /// Retention for `extension`, with the live document protected.
    fn retention(&self, extension: &str) -> RetentionPolicy {
        let policy = RetentionPolicy::new(extension)
            .with_sidecar(self.options.sidecar_extension.as_deref());
        match self.host.active_document().and_then(|d| d.path) {
            Some(path) => policy.with_protected(path),
            None => policy,
        }
    }

    async fn capture(
        &self,
        directory: &Path,
        document: &Document,
        kind: SnapshotKind,
        at: DateTime<Local>,
    ) -> SnapshotResult<Snapshot> {
        let writer = SnapshotWriter::with_options(directory, self.options.writer);
        match writer.write(&self.host, document, kind, at).await {
            Ok(snapshot) => {
                self.events
                    .publish(AutosaveEvent::SnapshotWritten(snapshot.clone()));
                Ok(snapshot)
            }
            Err(e) => {
                error!(kind = %kind, document = %document.name, error = %e, "Snapshot failed");
                self.events.publish(AutosaveEvent::SnapshotFailed {
                    kind,
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Prune after a successful write. Failures are logged, never returned.
    async fn prune(&self, directory: &Path, extension: &str, max_snapshots: u32) {
        match self
            .retention(extension)
            .prune(directory, max_snapshots)
            .await
        {
            Ok(report) => self.publish_pruned(&report),
            Err(e) => error!(directory = %directory.display(), error = %e, "Retention pass failed"),
        }
    }

    fn publish_pruned(&self, report: &PruneReport) {
        if !report.deleted.is_empty() || !report.failures.is_empty() {
            self.events.publish(AutosaveEvent::Pruned {
                deleted: report.deleted.clone(),
                failures: report.failures.len(),
            });
        }
    }

    fn config_changed(&self, settings: &Settings<S>) {
        self.events
            .publish(AutosaveEvent::ConfigChanged(settings.config().clone()));
    }
}
