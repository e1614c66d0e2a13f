//! Path utilities.
//!
//! Settings store directories as entered by the user, usually relative to the
//! project. These helpers turn them into absolute locations.

use std::path::{Component, Path, PathBuf};

/// Name of the project-local state directory.
pub const STATE_DIR_NAME: &str = ".autosaver";

/// Get the project-local autosaver directory.
pub fn project_state_dir(project_root: &Path) -> PathBuf {
    project_root.join(STATE_DIR_NAME)
}

/// Default location of the preference file for a project.
pub fn default_prefs_path(project_root: &Path) -> PathBuf {
    project_state_dir(project_root).join("prefs.json")
}

/// Normalize a path by removing `.` and `..` components.
///
/// Unlike `canonicalize`, this doesn't require the path to exist.
pub fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();

    for component in path.components() {
        match component {
            Component::ParentDir => {
                result.pop();
            }
            Component::CurDir => {}
            _ => result.push(component),
        }
    }

    result
}

/// Resolve a configured directory against the project root.
///
/// Absolute paths are kept as-is; relative ones (including the default
/// `AutoSave/`) land under `project_root`.
pub fn resolve_in_project(project_root: &Path, configured: &Path) -> PathBuf {
    if configured.is_absolute() {
        normalize(configured)
    } else {
        normalize(&project_root.join(configured))
    }
}

/// Find the project root by walking up the directory tree.
///
/// Looks for `.autosaver/`, `.git/`, or the `Assets/` + `ProjectSettings/`
/// pair that scene editors keep at the top of a project.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        if current.join(STATE_DIR_NAME).is_dir()
            || current.join(".git").exists()
            || (current.join("Assets").is_dir() && current.join("ProjectSettings").is_dir())
        {
            return Some(current);
        }

        if !current.pop() {
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_normalize() {
        let path = Path::new("/home/user/./project/../project/AutoSave");
        assert_eq!(normalize(path), PathBuf::from("/home/user/project/AutoSave"));
    }

    #[test]
    fn test_resolve_relative_and_absolute() {
        let root = Path::new("/work/game");
        assert_eq!(
            resolve_in_project(root, Path::new("AutoSave/")),
            PathBuf::from("/work/game/AutoSave")
        );
        assert_eq!(
            resolve_in_project(root, Path::new("/backups/scenes")),
            PathBuf::from("/backups/scenes")
        );
    }

    #[test]
    fn test_default_prefs_path() {
        let path = default_prefs_path(Path::new("/work/game"));
        assert_eq!(path, PathBuf::from("/work/game/.autosaver/prefs.json"));
    }

    #[test]
    fn test_find_project_root() {
        let dir = tempdir().unwrap();
        let project = dir.path().join("game");
        std::fs::create_dir_all(project.join("Assets/Scenes")).unwrap();
        std::fs::create_dir_all(project.join("ProjectSettings")).unwrap();

        let root = find_project_root(&project.join("Assets/Scenes"));
        assert_eq!(root, Some(project));
    }
}
