//! Keeps the managed directory down to the newest N snapshots.

use crate::writer::with_suffix;
use crate::{PruneDeleteError, SnapshotName, SnapshotResult};
use autosaver_util::TimingGuard;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tracing::{debug, info, warn};

/// Extension of the metadata companion written next to each snapshot.
pub const DEFAULT_SIDECAR_EXTENSION: &str = "meta";

/// A primary snapshot file found in the managed directory.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    pub path: PathBuf,
    pub file_name: String,
    /// Creation time, or modification time where the platform has no birth time.
    pub created: SystemTime,
    /// Parsed name, if the file follows the snapshot naming scheme.
    pub name: Option<SnapshotName>,
}

/// Result of a prune pass.
#[derive(Debug, Default)]
pub struct PruneReport {
    /// Number of primary files left in place.
    pub kept: usize,
    /// Primary files that were deleted.
    pub deleted: Vec<PathBuf>,
    /// Sidecars deleted together with their primary.
    pub sidecars_deleted: Vec<PathBuf>,
    /// Individual deletions that failed.
    pub failures: Vec<PruneDeleteError>,
}

impl PruneReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Retention rules for one managed extension.
#[derive(Debug, Clone)]
pub struct RetentionPolicy {
    extension: String,
    sidecar_extension: Option<String>,
    protected: Vec<PathBuf>,
}

impl RetentionPolicy {
    /// Manage files with `extension` (no leading dot) and `.meta` sidecars.
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into().trim_start_matches('.').to_string(),
            sidecar_extension: Some(DEFAULT_SIDECAR_EXTENSION.to_string()),
            protected: Vec::new(),
        }
    }

    /// Use a different sidecar suffix, or none.
    pub fn with_sidecar(mut self, sidecar_extension: Option<&str>) -> Self {
        self.sidecar_extension = sidecar_extension.map(|s| s.trim_start_matches('.').to_string());
        self
    }

    /// Never list or delete `path`, even if it has the managed extension.
    ///
    /// Pass the live document so a snapshot directory that also holds the
    /// document itself cannot prune it.
    pub fn with_protected(mut self, path: impl Into<PathBuf>) -> Self {
        self.protected.push(path.into());
        self
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    async fn canonical_protected(&self) -> Vec<PathBuf> {
        let mut canonical = Vec::with_capacity(self.protected.len());
        for path in &self.protected {
            if let Ok(path) = fs::canonicalize(path).await {
                canonical.push(path);
            }
        }
        canonical
    }

    fn matches(&self, path: &Path) -> bool {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        extension == self.extension
    }

    /// List managed snapshots, newest first.
    ///
    /// Ordered by creation time, ties broken by filename (both descending).
    /// A missing directory lists as empty. Protected paths are left out.
    pub async fn list(&self, directory: &Path) -> SnapshotResult<Vec<SnapshotFile>> {
        let mut files = Vec::new();
        let protected = self.canonical_protected().await;

        let mut entries = match fs::read_dir(directory).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(files),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !self.matches(&path) {
                continue;
            }

            let metadata = match entry.metadata().await {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable entry");
                    continue;
                }
            };
            if !metadata.is_file() {
                continue;
            }
            if !protected.is_empty() && is_protected(&path, &protected).await {
                debug!(path = %path.display(), "Skipping protected file");
                continue;
            }

            let created = metadata
                .created()
                .or_else(|_| metadata.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            let file_name = entry.file_name().to_string_lossy().into_owned();

            files.push(SnapshotFile {
                name: SnapshotName::parse(&file_name),
                path,
                file_name,
                created,
            });
        }

        files.sort_by(newest_first);
        Ok(files)
    }

    /// Delete everything beyond the newest `max_snapshots` files.
    ///
    /// A cap of 0 is treated as 1. Each failed deletion is logged and recorded
    /// in the report; the remaining candidates are still processed.
    pub async fn prune(&self, directory: &Path, max_snapshots: u32) -> SnapshotResult<PruneReport> {
        let keep = max_snapshots.max(1) as usize;
        let files = self.list(directory).await?;

        let mut report = PruneReport {
            kept: files.len().min(keep),
            ..PruneReport::default()
        };
        if files.len() <= keep {
            debug!(
                directory = %directory.display(),
                count = files.len(),
                keep,
                "Nothing to prune"
            );
            return Ok(report);
        }

        let _timing = TimingGuard::prune(directory.display().to_string());

        for file in files.into_iter().skip(keep) {
            if let Err(source) = fs::remove_file(&file.path).await {
                warn!(path = %file.path.display(), error = %source, "Failed to delete old snapshot");
                report.failures.push(PruneDeleteError {
                    path: file.path,
                    source,
                });
                continue;
            }
            info!(file = %file.file_name, "Deleted old snapshot");

            if let Some(sidecar_ext) = &self.sidecar_extension {
                let sidecar = with_suffix(&file.path, sidecar_ext);
                match fs::remove_file(&sidecar).await {
                    Ok(()) => {
                        debug!(path = %sidecar.display(), "Deleted sidecar");
                        report.sidecars_deleted.push(sidecar);
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(source) => {
                        warn!(path = %sidecar.display(), error = %source, "Failed to delete sidecar");
                        report.failures.push(PruneDeleteError {
                            path: sidecar,
                            source,
                        });
                    }
                }
            }

            report.deleted.push(file.path);
        }

        Ok(report)
    }
}

async fn is_protected(path: &Path, protected: &[PathBuf]) -> bool {
    match fs::canonicalize(path).await {
        Ok(canonical) => protected.contains(&canonical),
        Err(_) => false,
    }
}

fn newest_first(a: &SnapshotFile, b: &SnapshotFile) -> Ordering {
    b.created
        .cmp(&a.created)
        .then_with(|| b.file_name.cmp(&a.file_name))
}
