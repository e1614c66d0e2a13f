//! Autosaver - periodic snapshots of an open document.
//!
//! This is the main entry point for the autosaver CLI.

mod commands;

use autosaver_util::log::{self, LogConfig};
use clap::{Parser, Subcommand};
use commands::{
    handle_config, handle_list, handle_prune, handle_save, handle_watch, ConfigCommands, Workspace,
};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "autosaver")]
#[command(author, version, about = "Periodic timestamped snapshots with retention", long_about = None)]
struct Cli {
    /// Project root (defaults to the nearest enclosing project, else the current directory)
    #[arg(long, global = true)]
    project: Option<PathBuf>,

    /// Preference file (defaults to <project>/.autosaver/prefs.json)
    #[arg(long, global = true)]
    prefs: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Append logs to this file (`watch` defaults to the user log directory)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Subcommand
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Snapshot a document on the configured interval until Ctrl-C
    Watch {
        /// Document to snapshot
        document: PathBuf,
        /// How often the scheduler is polled, in seconds
        #[arg(long, default_value = "1")]
        tick_seconds: u64,
    },
    /// Take one manual snapshot
    Save {
        /// Document to snapshot
        document: PathBuf,
    },
    /// Delete snapshots beyond the retention cap
    Prune {
        /// Extension of the managed snapshots
        #[arg(short, long, default_value = "unity")]
        extension: String,
    },
    /// List managed snapshots, newest first
    List {
        /// Extension of the managed snapshots
        #[arg(short, long, default_value = "unity")]
        extension: String,
    },
    /// Show or change autosave settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_file = cli.log_file.clone().or_else(|| match cli.command {
        Commands::Watch { .. } => log::default_log_path(),
        _ => None,
    });
    let mut log_config = LogConfig::for_cli(cli.verbose);
    if let Some(path) = &log_file {
        log_config = log_config.with_file(path);
    }
    log::init(log_config);

    let workspace = Workspace::resolve(cli.project, cli.prefs)?;
    tracing::debug!(
        project = %workspace.project_root.display(),
        prefs = %workspace.prefs_path.display(),
        log_file = ?log_file,
        "Resolved workspace"
    );

    match cli.command {
        Commands::Watch {
            document,
            tick_seconds,
        } => handle_watch(&workspace, document, Duration::from_secs(tick_seconds.max(1))).await,
        Commands::Save { document } => handle_save(&workspace, document).await,
        Commands::Prune { extension } => handle_prune(&workspace, &extension).await,
        Commands::List { extension } => handle_list(&workspace, &extension).await,
        Commands::Config { command } => handle_config(&workspace, command).await,
    }
}
