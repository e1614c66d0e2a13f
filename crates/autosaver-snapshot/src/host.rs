//! The seam between autosave and the editor that owns the document.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::fs;
use tracing::debug;

/// The document currently open in the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Display name, used as the snapshot filename prefix.
    pub name: String,
    /// Extension without the leading dot (e.g. `unity`).
    pub extension: String,
    /// Where the document lives. `None` for a document that was never saved.
    pub path: Option<PathBuf>,
}

impl Document {
    /// Describe a document stored at `path`.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name,
            extension,
            path: Some(path),
        }
    }

    /// A document that has been saved at least once and has a name.
    pub fn is_named(&self) -> bool {
        !self.name.trim().is_empty() && self.path.is_some()
    }
}

/// Operations autosave needs from the host editor.
///
/// `save_copy_as` must write the document to `target` while leaving the live
/// document bound to its original location.
#[async_trait]
pub trait DocumentHost: Send + Sync {
    /// The active document, if any.
    fn active_document(&self) -> Option<Document>;

    /// Whether the host is in an editable mode (not running/playing).
    fn is_editable(&self) -> bool {
        true
    }

    /// Flag the in-memory document as modified so the save primitive flushes it.
    async fn mark_dirty(&self, _document: &Document) -> anyhow::Result<()> {
        Ok(())
    }

    /// Save a copy of `document` to `target`.
    ///
    /// `Ok(false)` is a reported failure; `Err` is a fault.
    async fn save_copy_as(&self, document: &Document, target: &Path) -> anyhow::Result<bool>;
}

/// A host whose document is a plain file on disk.
///
/// Saving a copy copies the file's current bytes. Used by the CLI and tests.
pub struct FileHost {
    document_path: Option<PathBuf>,
    editable: AtomicBool,
}

impl FileHost {
    pub fn new(document_path: impl Into<PathBuf>) -> Self {
        Self {
            document_path: Some(document_path.into()),
            editable: AtomicBool::new(true),
        }
    }

    /// A host with nothing open, for retention-only work.
    pub fn detached() -> Self {
        Self {
            document_path: None,
            editable: AtomicBool::new(true),
        }
    }

    pub fn document_path(&self) -> Option<&Path> {
        self.document_path.as_deref()
    }

    /// Simulate the host entering or leaving a non-editable mode.
    pub fn set_editable(&self, editable: bool) {
        self.editable.store(editable, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentHost for FileHost {
    fn active_document(&self) -> Option<Document> {
        self.document_path
            .as_ref()
            .filter(|path| path.is_file())
            .map(Document::from_path)
    }

    fn is_editable(&self) -> bool {
        self.editable.load(Ordering::SeqCst)
    }

    async fn save_copy_as(&self, document: &Document, target: &Path) -> anyhow::Result<bool> {
        let Some(source) = document.path.as_deref() else {
            return Ok(false);
        };
        let bytes = fs::copy(source, target).await?;
        debug!(
            source = %source.display(),
            target = %target.display(),
            bytes,
            "Copied document"
        );
        Ok(true)
    }
}
