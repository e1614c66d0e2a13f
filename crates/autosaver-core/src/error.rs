//! Error types for the core crate.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Settings could not be read or persisted.
    #[error("storage error: {0}")]
    Storage(#[from] autosaver_storage::StorageError),

    /// A snapshot could not be written or listed.
    #[error("snapshot error: {0}")]
    Snapshot(#[from] autosaver_snapshot::SnapshotError),

    /// The host has no saved, named document open.
    #[error("no active document to snapshot")]
    NoActiveDocument,
}
