//! Settings command handlers.

use super::Workspace;
use autosaver_core::{AutosaveConfig, JsonPrefStore, Settings};
use clap::Subcommand;
use std::path::PathBuf;

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current settings
    Show,
    /// Set minutes between automatic snapshots (minimum 0.1)
    SetInterval {
        minutes: f64,
    },
    /// Set how many snapshots to keep (minimum 1)
    SetMax {
        #[arg(allow_negative_numbers = true)]
        count: i64,
    },
    /// Set the snapshot directory (relative paths are project-relative)
    SetDir {
        directory: PathBuf,
    },
    /// Turn automatic snapshots on
    Enable,
    /// Turn automatic snapshots off
    Disable,
    /// Flip automatic snapshots on or off
    Toggle,
}

/// Handle config commands.
pub async fn handle_config(workspace: &Workspace, command: ConfigCommands) -> anyhow::Result<()> {
    let mut settings = Settings::load(workspace.store(), &workspace.project_root).await;

    match command {
        ConfigCommands::Show => {}
        ConfigCommands::SetInterval { minutes } => settings.set_interval_minutes(minutes).await?,
        ConfigCommands::SetMax { count } => settings.set_max_snapshots(count).await?,
        ConfigCommands::SetDir { directory } => settings.set_directory(directory).await?,
        ConfigCommands::Enable => settings.set_enabled(true).await?,
        ConfigCommands::Disable => settings.set_enabled(false).await?,
        ConfigCommands::Toggle => {
            settings.toggle().await?;
        }
    }

    print!("{}", describe(&settings));
    Ok(())
}

fn describe(settings: &Settings<JsonPrefStore>) -> String {
    let AutosaveConfig {
        enabled,
        interval_minutes,
        directory,
        max_snapshots,
    } = settings.config();

    format!(
        "Enabled:   {}\nInterval:  {} min\nDirectory: {} ({})\nMax files: {}\nPrefs:     {}\n",
        if *enabled { "yes" } else { "no" },
        interval_minutes,
        directory.display(),
        settings.directory().display(),
        max_snapshots,
        settings.store().path().display(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_config_commands_persist() {
        let dir = TempDir::new().unwrap();
        let workspace = Workspace::resolve(Some(dir.path().to_path_buf()), None).unwrap();

        handle_config(&workspace, ConfigCommands::SetMax { count: 0 })
            .await
            .unwrap();
        handle_config(&workspace, ConfigCommands::Disable)
            .await
            .unwrap();

        let settings = Settings::load(workspace.store(), &workspace.project_root).await;
        assert_eq!(settings.config().max_snapshots, 1);
        assert!(!settings.config().enabled);
        assert!(describe(&settings).contains("Enabled:   no"));
    }
}
