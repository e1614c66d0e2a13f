//! The watch loop.
//!
//! Polls the scheduler from a tokio interval. Each tick awaits its snapshot
//! and prune before the next one is taken, so ticks never overlap.

use super::Workspace;
use autosaver_core::{AutosaveEvent, SkipReason, TickOutcome};
use chrono::Local;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

/// Snapshot `document` until Ctrl-C, then persist settings.
pub async fn handle_watch(
    workspace: &Workspace,
    document: PathBuf,
    tick_every: Duration,
) -> anyhow::Result<()> {
    let autosaver = workspace.autosaver(document.clone()).await?;
    let config = autosaver.config().await;
    if !config.enabled {
        warn!("Autosave is disabled; ticks are skipped until it is enabled");
    }
    println!(
        "Watching {} every {} min, keeping {} in {} (Ctrl-C to stop)",
        document.display(),
        config.interval_minutes,
        config.max_snapshots,
        autosaver.directory().await.display()
    );

    let reporter = tokio::spawn(report_events(autosaver.subscribe()));

    let mut ticker = tokio::time::interval(tick_every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_skip = None;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match autosaver.tick(Local::now()).await {
                    TickOutcome::Saved(_) | TickOutcome::Failed(_) => last_skip = None,
                    TickOutcome::NotDue { remaining } => {
                        trace!(remaining_secs = remaining.as_secs(), "Snapshot not due");
                    }
                    TickOutcome::Skipped(reason) => log_skip(&mut last_skip, reason),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                break;
            }
        }
    }

    autosaver.shutdown().await?;
    reporter.abort();
    Ok(())
}

/// Log a skip reason once per change rather than on every tick.
fn log_skip(last: &mut Option<SkipReason>, reason: SkipReason) {
    if *last != Some(reason) {
        debug!(%reason, "Skipping autosave");
        *last = Some(reason);
    }
}

async fn report_events(mut rx: broadcast::Receiver<AutosaveEvent>) {
    loop {
        match rx.recv().await {
            Ok(AutosaveEvent::SnapshotWritten(snapshot)) => {
                println!("Saved: {}", snapshot.path.display());
            }
            Ok(AutosaveEvent::SnapshotFailed { kind, message }) => {
                eprintln!("{kind} snapshot failed: {message}");
            }
            Ok(AutosaveEvent::Pruned { deleted, failures }) => {
                for path in deleted {
                    println!("Deleted: {}", path.display());
                }
                if failures > 0 {
                    eprintln!("{failures} old snapshot(s) could not be deleted");
                }
            }
            Ok(AutosaveEvent::ConfigChanged(_)) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                debug!(skipped, "Event reporter lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
