//! Writes one snapshot of the active document.

use crate::{Document, DocumentHost, Snapshot, SnapshotError, SnapshotKind, SnapshotName, SnapshotResult};
use autosaver_util::TimingGuard;
use chrono::{DateTime, Local};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Hidden sub-directory used for staged writes. Retention only scans regular
/// files directly inside the managed directory, so nothing in here is visible
/// to it.
pub const STAGING_DIR_NAME: &str = ".staging";

/// Options for [`SnapshotWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterOptions {
    /// Have the host write into the staging directory and rename the result
    /// into place once it reports success.
    pub staged: bool,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self { staged: true }
    }
}

/// Produces timestamped copies of a document in a managed directory.
///
/// Layout:
/// ```text
/// directory/
///   Level1_Auto_20240301_120000.unity
///   Level1_Auto_20240301_120000.unity.meta   # host sidecar, optional
///   Level1_Manual_20240301_121503.unity
///   .staging/                                # in-flight writes
/// ```
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    directory: PathBuf,
    options: WriterOptions,
}

impl SnapshotWriter {
    /// Create a writer targeting `directory` with default options.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self::with_options(directory, WriterOptions::default())
    }

    pub fn with_options(directory: impl Into<PathBuf>, options: WriterOptions) -> Self {
        Self {
            directory: directory.into(),
            options,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn set_directory(&mut self, directory: impl Into<PathBuf>) {
        self.directory = directory.into();
    }

    pub fn options(&self) -> WriterOptions {
        self.options
    }

    /// Write one snapshot of `document`, timestamped `at`.
    ///
    /// The host saves a copy; the live document keeps its own location.
    /// Host errors and panics are turned into [`SnapshotError::SaveFault`].
    pub async fn write<H>(
        &self,
        host: &H,
        document: &Document,
        kind: SnapshotKind,
        at: DateTime<Local>,
    ) -> SnapshotResult<Snapshot>
    where
        H: DocumentHost + ?Sized,
    {
        validate_document(document)?;

        create_dir(&self.directory).await?;

        let name = SnapshotName::new(&document.name, kind, at, &document.extension);
        let file_name = name.file_name();
        let final_path = self.directory.join(&file_name);
        let _timing = TimingGuard::snapshot(&file_name);

        let target = if self.options.staged {
            let staging = self.directory.join(STAGING_DIR_NAME);
            create_dir(&staging).await?;
            staging.join(&file_name)
        } else {
            final_path.clone()
        };

        if let Err(err) = self.save(host, document, &target).await {
            if self.options.staged {
                discard_staged(&target).await;
            }
            return Err(err);
        }

        if self.options.staged {
            commit(&target, &final_path).await?;
        }

        info!(
            file = %file_name,
            kind = %kind,
            directory = %self.directory.display(),
            "Snapshot written"
        );

        Ok(Snapshot {
            path: final_path,
            name,
            created_at: at,
        })
    }

    async fn save<H>(&self, host: &H, document: &Document, target: &Path) -> SnapshotResult<()>
    where
        H: DocumentHost + ?Sized,
    {
        match AssertUnwindSafe(host.mark_dirty(document)).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(SnapshotError::save_fault(format!(
                    "could not mark {} dirty: {e:#}",
                    document.name
                )))
            }
            Err(panic) => return Err(SnapshotError::save_fault(panic_message(panic))),
        }

        match AssertUnwindSafe(host.save_copy_as(document, target))
            .catch_unwind()
            .await
        {
            Ok(Ok(true)) => {}
            Ok(Ok(false)) => {
                return Err(SnapshotError::save_failed(format!(
                    "host could not save {} to {}",
                    document.name,
                    target.display()
                )))
            }
            Ok(Err(e)) => return Err(SnapshotError::save_fault(format!("{e:#}"))),
            Err(panic) => return Err(SnapshotError::save_fault(panic_message(panic))),
        }

        if !fs::try_exists(target).await.unwrap_or(false) {
            return Err(SnapshotError::save_failed(format!(
                "host reported success but {} does not exist",
                target.display()
            )));
        }

        Ok(())
    }
}

fn validate_document(document: &Document) -> SnapshotResult<()> {
    if !document.is_named() {
        return Err(SnapshotError::InvalidDocument(
            "document has no name or was never saved".to_string(),
        ));
    }
    if document.name.contains(['/', '\\']) || document.extension.contains(['/', '\\']) {
        return Err(SnapshotError::InvalidDocument(format!(
            "document name {:?} contains a path separator",
            document.name
        )));
    }
    Ok(())
}

async fn create_dir(path: &Path) -> SnapshotResult<()> {
    if fs::try_exists(path).await.unwrap_or(false) {
        return Ok(());
    }

    fs::create_dir_all(path)
        .await
        .map_err(|source| SnapshotError::DirectoryCreate {
            path: path.to_path_buf(),
            source,
        })?;
    debug!(path = %path.display(), "Created snapshot directory");
    Ok(())
}

/// Move a staged snapshot (and any sidecar the host produced) into place.
async fn commit(staged: &Path, final_path: &Path) -> SnapshotResult<()> {
    if let Err(source) = fs::rename(staged, final_path).await {
        discard_staged(staged).await;
        return Err(SnapshotError::Commit {
            path: final_path.to_path_buf(),
            source,
        });
    }

    let staged_sidecar = with_suffix(staged, crate::DEFAULT_SIDECAR_EXTENSION);
    if fs::try_exists(&staged_sidecar).await.unwrap_or(false) {
        let sidecar = with_suffix(final_path, crate::DEFAULT_SIDECAR_EXTENSION);
        if let Err(e) = fs::rename(&staged_sidecar, &sidecar).await {
            warn!(path = %staged_sidecar.display(), error = %e, "Failed to move staged sidecar");
        }
    }

    Ok(())
}

/// Best-effort removal of a failed staged write.
async fn discard_staged(staged: &Path) {
    for path in [
        staged.to_path_buf(),
        with_suffix(staged, crate::DEFAULT_SIDECAR_EXTENSION),
    ] {
        match fs::remove_file(&path).await {
            Ok(()) => debug!(path = %path.display(), "Discarded staged file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to discard staged file"),
        }
    }
}

/// `file.unity` + `meta` -> `file.unity.meta`
pub(crate) fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".");
    os.push(suffix);
    PathBuf::from(os)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("host panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("host panicked: {s}")
    } else {
        "host panicked".to_string()
    }
}
