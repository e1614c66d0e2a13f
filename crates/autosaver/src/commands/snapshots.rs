//! Manual save, prune and list handlers.

use super::Workspace;
use chrono::{DateTime, Local};
use std::path::PathBuf;

/// Take one manual snapshot and prune.
pub async fn handle_save(workspace: &Workspace, document: PathBuf) -> anyhow::Result<()> {
    let autosaver = workspace.autosaver(document).await?;
    let snapshot = autosaver.save_now().await?;
    println!("Saved: {}", snapshot.path.display());
    Ok(())
}

/// Run a retention pass over the configured directory.
pub async fn handle_prune(workspace: &Workspace, extension: &str) -> anyhow::Result<()> {
    let autosaver = workspace.detached_autosaver(extension).await;
    let report = autosaver.prune_now().await?;

    for path in &report.deleted {
        println!("Deleted: {}", path.display());
    }
    for failure in &report.failures {
        eprintln!("Could not delete {}: {}", failure.path.display(), failure.source);
    }
    println!(
        "Kept {} snapshot(s), deleted {}.",
        report.kept,
        report.deleted.len()
    );

    if !report.is_clean() {
        anyhow::bail!("{} snapshot(s) could not be deleted", report.failures.len());
    }
    Ok(())
}

/// Print managed snapshots, newest first.
pub async fn handle_list(workspace: &Workspace, extension: &str) -> anyhow::Result<()> {
    let autosaver = workspace.detached_autosaver(extension).await;
    let files = autosaver.list_snapshots().await?;

    if files.is_empty() {
        println!("No snapshots in {}.", autosaver.directory().await.display());
        return Ok(());
    }

    println!("{:<20} {:<8} {}", "CREATED", "KIND", "FILE");
    println!("{}", "-".repeat(60));
    for file in files {
        let created: DateTime<Local> = file.created.into();
        let kind = file
            .name
            .as_ref()
            .map(|name| name.kind.as_str())
            .unwrap_or("-");
        println!(
            "{:<20} {:<8} {}",
            created.format("%Y-%m-%d %H:%M:%S"),
            kind,
            file.file_name
        );
    }
    Ok(())
}
