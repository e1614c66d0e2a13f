//! Snapshot writing and retention for autosaver.
//!
//! This crate provides the filesystem half of autosave:
//! - Writing timestamped copies of the active document through the host
//! - Pruning the managed directory down to the newest N snapshots
//! - Deleting metadata sidecars together with their primary file
//!
//! # Example
//!
//! ```no_run
//! use autosaver_snapshot::{FileHost, DocumentHost, RetentionPolicy, SnapshotKind, SnapshotWriter};
//! use chrono::Local;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let host = FileHost::new("Assets/Scenes/Level1.unity");
//! let writer = SnapshotWriter::new("AutoSave");
//!
//! if let Some(document) = host.active_document() {
//!     let snapshot = writer.write(&host, &document, SnapshotKind::Manual, Local::now()).await?;
//!     RetentionPolicy::new(&snapshot.name.extension)
//!         .prune(writer.directory(), 10)
//!         .await?;
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod host;
mod retention;
mod snapshot;
mod writer;

pub use error::{PruneDeleteError, SnapshotError, SnapshotResult};
pub use host::{Document, DocumentHost, FileHost};
pub use retention::{PruneReport, RetentionPolicy, SnapshotFile, DEFAULT_SIDECAR_EXTENSION};
pub use snapshot::{Snapshot, SnapshotKind, SnapshotName, TIMESTAMP_FORMAT};
pub use writer::{SnapshotWriter, WriterOptions, STAGING_DIR_NAME};
