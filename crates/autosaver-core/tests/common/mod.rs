//! Shared fixtures for autosave integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use autosaver_core::{Document, DocumentHost};
use chrono::{DateTime, Local, NaiveDate, TimeZone};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tempfile::TempDir;

/// A scene editor stand-in.
///
/// The document is a file on disk; saving a copy also writes a `.meta`
/// sidecar the way an asset importer would.
pub struct SceneHost {
    document: Option<PathBuf>,
    editable: AtomicBool,
    fail_next: AtomicBool,
    pub saves: AtomicUsize,
}

impl SceneHost {
    pub fn new(project: &TempDir, name: &str) -> Self {
        let path = project.path().join("Assets").join(format!("{name}.unity"));
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, format!("scene: {name}")).unwrap();
        Self {
            document: Some(path),
            editable: AtomicBool::new(true),
            fail_next: AtomicBool::new(false),
            saves: AtomicUsize::new(0),
        }
    }

    pub fn without_document() -> Self {
        Self {
            document: None,
            editable: AtomicBool::new(true),
            fail_next: AtomicBool::new(false),
            saves: AtomicUsize::new(0),
        }
    }

    pub fn set_editable(&self, editable: bool) {
        self.editable.store(editable, Ordering::SeqCst);
    }

    /// Make the next save report failure.
    pub fn fail_next_save(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentHost for SceneHost {
    fn active_document(&self) -> Option<Document> {
        self.document.as_ref().map(Document::from_path)
    }

    fn is_editable(&self) -> bool {
        self.editable.load(Ordering::SeqCst)
    }

    async fn save_copy_as(&self, document: &Document, target: &Path) -> anyhow::Result<bool> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Ok(false);
        }
        let source = document.path.as_ref().expect("named document");
        tokio::fs::copy(source, target).await?;

        let mut meta = target.as_os_str().to_owned();
        meta.push(".meta");
        tokio::fs::write(PathBuf::from(meta), "guid: 0000").await?;

        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }
}

/// 2024-03-01 12:00:00 local time.
pub fn t0() -> DateTime<Local> {
    let naive = NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();
    Local.from_local_datetime(&naive).earliest().unwrap()
}

/// Regular files directly in `dir`, sorted.
pub fn files_in(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Primary snapshot files (excluding sidecars), sorted.
pub fn snapshots_in(dir: &Path) -> Vec<String> {
    files_in(dir)
        .into_iter()
        .filter(|name| name.ends_with(".unity"))
        .collect()
}
