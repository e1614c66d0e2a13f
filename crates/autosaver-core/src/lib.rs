//! Core autosave logic.
//!
//! This crate ties the pieces together:
//! - Settings adapter with clamped, immediately persisted setters
//! - Interval scheduler driven by host ticks
//! - Event publisher for control surfaces
//! - The [`Autosaver`] context that owns all mutable autosave state

pub mod autosaver;
pub mod config;
pub mod error;
pub mod events;
pub mod scheduler;

pub use autosaver::{Autosaver, AutosaverOptions};
pub use config::{AutosaveConfig, Settings};
pub use error::{CoreError, CoreResult};
pub use events::{AutosaveEvent, EventPublisher};
pub use scheduler::{AutosaveScheduler, Gate, SkipReason, TickOutcome};

pub use autosaver_snapshot::{
    Document, DocumentHost, FileHost, PruneReport, Snapshot, SnapshotError, SnapshotFile,
    SnapshotKind, SnapshotName, WriterOptions,
};
pub use autosaver_storage::{JsonPrefStore, MemoryPrefStore, PrefStore};
