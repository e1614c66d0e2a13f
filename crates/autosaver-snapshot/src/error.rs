//! Snapshot error types.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for snapshot operations.
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Errors that can occur while writing or listing snapshots.
///
/// None of these are fatal: the scheduler logs them and retries on the next tick.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The snapshot directory could not be created.
    #[error("Failed to create snapshot directory {}: {source}", path.display())]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The host save primitive reported failure.
    #[error("Save failed: {0}")]
    SaveFailed(String),

    /// The host raised an error or panicked while saving.
    #[error("Save fault: {0}")]
    SaveFault(String),

    /// A staged snapshot could not be moved into the managed directory.
    #[error("Failed to commit snapshot {}: {source}", path.display())]
    Commit {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document cannot be snapshotted (empty or path-like name).
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SnapshotError {
    /// Create a save failed error.
    pub fn save_failed(message: impl Into<String>) -> Self {
        Self::SaveFailed(message.into())
    }

    /// Create a save fault error.
    pub fn save_fault(message: impl Into<String>) -> Self {
        Self::SaveFault(message.into())
    }
}

/// A single snapshot or sidecar that could not be deleted during pruning.
#[derive(Debug, Error)]
#[error("Failed to delete {}: {source}", path.display())]
pub struct PruneDeleteError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_create_mentions_path() {
        let err = SnapshotError::DirectoryCreate {
            path: PathBuf::from("/locked/AutoSave"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let message = err.to_string();
        assert!(message.contains("/locked/AutoSave"));
        assert!(message.contains("denied"));
    }

    #[test]
    fn save_helpers_format() {
        assert_eq!(
            SnapshotError::save_failed("host returned false").to_string(),
            "Save failed: host returned false"
        );
        assert_eq!(
            SnapshotError::save_fault("boom").to_string(),
            "Save fault: boom"
        );
    }

    #[test]
    fn prune_delete_error_formats() {
        let err = PruneDeleteError {
            path: PathBuf::from("AutoSave/Level1_Auto_20240101_120000.unity"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "busy"),
        };
        assert!(err.to_string().starts_with("Failed to delete AutoSave/Level1_Auto"));
    }
}
