//! Interval gate for automatic snapshots.
//!
//! The scheduler only answers "is a snapshot due?". Guard conditions and the
//! actual write live in [`crate::Autosaver::tick`].

use autosaver_snapshot::{Snapshot, SnapshotError};
use chrono::{DateTime, Local};
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Why a tick did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Autosave is switched off.
    Disabled,
    /// The host is in a non-editable mode.
    NotEditable,
    /// No saved, named document is open.
    NoDocument,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::Disabled => "autosave disabled",
            SkipReason::NotEditable => "host not editable",
            SkipReason::NoDocument => "no active document",
        };
        f.write_str(text)
    }
}

/// What one tick did.
#[derive(Debug)]
pub enum TickOutcome {
    Skipped(SkipReason),
    NotDue { remaining: Duration },
    Saved(Snapshot),
    /// The write failed; the timer was not advanced, so the next tick retries.
    Failed(SnapshotError),
}

impl TickOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, TickOutcome::Saved(_))
    }
}

/// Result of checking the interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Due,
    NotDue(Duration),
}

/// Tracks when the last automatic snapshot succeeded.
#[derive(Debug, Clone)]
pub struct AutosaveScheduler {
    last_snapshot_time: DateTime<Local>,
}

impl AutosaveScheduler {
    /// Start counting the first interval at `started_at`.
    pub fn new(started_at: DateTime<Local>) -> Self {
        Self {
            last_snapshot_time: started_at,
        }
    }

    pub fn last_snapshot_time(&self) -> DateTime<Local> {
        self.last_snapshot_time
    }

    /// Due once `now - last_snapshot_time >= interval`.
    ///
    /// If the wall clock moved backwards the interval restarts at `now`.
    pub fn check(&mut self, now: DateTime<Local>, interval: Duration) -> Gate {
        match now.signed_duration_since(self.last_snapshot_time).to_std() {
            Ok(elapsed) if elapsed >= interval => Gate::Due,
            Ok(elapsed) => Gate::NotDue(interval - elapsed),
            Err(_) => {
                debug!(
                    last = %self.last_snapshot_time,
                    now = %now,
                    "Clock moved backwards, restarting autosave interval"
                );
                self.last_snapshot_time = now;
                Gate::NotDue(interval)
            }
        }
    }

    /// Record a successful automatic snapshot.
    pub fn record_success(&mut self, now: DateTime<Local>) {
        self.last_snapshot_time = now;
    }

    /// Restart the interval from `at`.
    pub fn reset(&mut self, at: DateTime<Local>) {
        self.last_snapshot_time = at;
    }
}
