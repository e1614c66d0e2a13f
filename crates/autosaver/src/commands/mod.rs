//! Command handlers for the autosaver CLI.

pub mod config;
pub mod snapshots;
pub mod watch;

pub use config::*;
pub use snapshots::*;
pub use watch::*;

use autosaver_core::{Autosaver, AutosaverOptions, FileHost, JsonPrefStore};
use autosaver_util::path::{default_prefs_path, find_project_root};
use std::path::PathBuf;

/// Project root and preference file shared by every command.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub project_root: PathBuf,
    pub prefs_path: PathBuf,
}

impl Workspace {
    /// Fill in defaults for the global `--project` and `--prefs` flags.
    pub fn resolve(project: Option<PathBuf>, prefs: Option<PathBuf>) -> anyhow::Result<Self> {
        let project_root = match project {
            Some(root) => root,
            None => {
                let cwd = std::env::current_dir()?;
                find_project_root(&cwd).unwrap_or(cwd)
            }
        };
        let prefs_path = prefs.unwrap_or_else(|| default_prefs_path(&project_root));

        Ok(Self {
            project_root,
            prefs_path,
        })
    }

    pub fn store(&self) -> JsonPrefStore {
        JsonPrefStore::new(&self.prefs_path)
    }

    /// Autosave context for a document on disk.
    pub async fn autosaver(
        &self,
        document: PathBuf,
    ) -> anyhow::Result<Autosaver<FileHost, JsonPrefStore>> {
        if !document.is_file() {
            anyhow::bail!("Document not found: {}", document.display());
        }
        Ok(Autosaver::load(
            FileHost::new(document),
            self.store(),
            &self.project_root,
            AutosaverOptions::default(),
        )
        .await)
    }

    /// Autosave context with no document open, managing `extension` files.
    pub async fn detached_autosaver(
        &self,
        extension: &str,
    ) -> Autosaver<FileHost, JsonPrefStore> {
        let options = AutosaverOptions {
            default_extension: extension.trim_start_matches('.').to_string(),
            ..AutosaverOptions::default()
        };
        Autosaver::load(
            FileHost::detached(),
            self.store(),
            &self.project_root,
            options,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_defaults_prefs_under_project() {
        let dir = TempDir::new().unwrap();
        let workspace = Workspace::resolve(Some(dir.path().to_path_buf()), None).unwrap();
        assert_eq!(
            workspace.prefs_path,
            dir.path().join(".autosaver").join("prefs.json")
        );
    }

    #[test]
    fn test_resolve_keeps_explicit_prefs() {
        let dir = TempDir::new().unwrap();
        let prefs = dir.path().join("custom.json");
        let workspace =
            Workspace::resolve(Some(dir.path().to_path_buf()), Some(prefs.clone())).unwrap();
        assert_eq!(workspace.prefs_path, prefs);
    }

    #[tokio::test]
    async fn test_detached_autosaver_manages_given_extension() {
        let dir = TempDir::new().unwrap();
        let workspace = Workspace::resolve(Some(dir.path().to_path_buf()), None).unwrap();
        let snapshots = dir.path().join("AutoSave");
        std::fs::create_dir_all(&snapshots).unwrap();
        std::fs::write(snapshots.join("Level1_Auto_20240301_120000.prefab"), "p").unwrap();
        std::fs::write(snapshots.join("Level1_Auto_20240301_120000.unity"), "u").unwrap();

        let autosaver = workspace.detached_autosaver(".prefab").await;
        let listed = autosaver.list_snapshots().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].file_name, "Level1_Auto_20240301_120000.prefab");
    }

    #[tokio::test]
    async fn test_autosaver_requires_existing_document() {
        let dir = TempDir::new().unwrap();
        let workspace = Workspace::resolve(Some(dir.path().to_path_buf()), None).unwrap();
        assert!(workspace
            .autosaver(dir.path().join("Missing.unity"))
            .await
            .is_err());
    }
}
