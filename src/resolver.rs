//! Priority resolution over the catalog and search-root bookkeeping.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::catalog::{self, CATALOG};
use crate::paths;

/// Source of user-configured search directories.
///
/// Read fresh on every search-root recomputation, so implementations must
/// be cheap and reflect the current settings.
pub trait SearchPathSource: Send + Sync {
    fn custom_search_paths(&self) -> Vec<PathBuf>;
}

/// In-memory search path list that can be replaced at runtime, e.g. when the
/// settings file is edited.
#[derive(Debug, Default)]
pub struct SearchPaths {
    paths: RwLock<Vec<PathBuf>>,
}

impl SearchPaths {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            paths: RwLock::new(paths),
        }
    }

    /// Replace the configured paths.
    pub fn set(&self, paths: Vec<PathBuf>) {
        *self.paths.write() = paths;
    }
}

impl SearchPathSource for SearchPaths {
    fn custom_search_paths(&self) -> Vec<PathBuf> {
        self.paths.read().clone()
    }
}

/// Highest-priority existing configuration file directly governing `dir`.
///
/// Tests every catalog entry under `dir` in order and returns the first
/// that is a regular file.
pub fn find_active_config(dir: &Path) -> Option<PathBuf> {
    CATALOG
        .iter()
        .map(|entry| dir.join(entry.key))
        .find(|candidate| candidate.is_file())
        .map(|found| paths::normalize(&found))
}

/// Directory a configuration file applies to.
///
/// The file's own directory, or the container's parent for entries nested
/// under `.config/`, `.vscode/` or `config/`. `None` when the path is not a
/// catalog entry.
pub fn search_root_for(path: &Path) -> Option<PathBuf> {
    let (_, entry) = catalog::lookup(path)?;
    let normalized = paths::normalize(path);
    let parent = normalized.parent()?;
    let root = if entry.container_relative {
        parent.parent()?
    } else {
        parent
    };
    Some(root.to_path_buf())
}

/// Compute the current search-root set.
///
/// Union of the project root, custom directories that exist, and the parent
/// directory of every tracked dictionary file. Missing custom directories
/// are skipped silently.
pub fn compute_search_roots<I>(
    project_root: &Path,
    source: &dyn SearchPathSource,
    dictionary_paths: I,
) -> BTreeSet<PathBuf>
where
    I: IntoIterator<Item = PathBuf>,
{
    let mut roots = BTreeSet::new();

    if project_root.is_dir() {
        roots.insert(paths::normalize_dir(project_root));
    }

    for custom in source.custom_search_paths() {
        let custom = if custom.is_absolute() {
            custom
        } else {
            project_root.join(custom)
        };
        if custom.is_dir() {
            roots.insert(paths::normalize_dir(&custom));
        } else {
            crate::debug_event!("roots", "skipping missing", "{}", custom.display());
        }
    }

    for dictionary in dictionary_paths {
        if let Some(parent) = dictionary.parent() {
            if parent.is_dir() {
                roots.insert(paths::normalize_dir(parent));
            }
        }
    }

    roots
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "{}").unwrap();
    }

    #[test]
    fn test_find_active_prefers_lowest_index() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("package.json"));
        touch(&root.join("cspell.yaml"));
        touch(&root.join("cspell.json"));
        touch(&root.join(".cspell.json"));

        let active = find_active_config(root).unwrap();
        assert!(active.ends_with(".cspell.json"));
    }

    #[test]
    fn test_find_active_considers_containers() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("package.json"));
        touch(&root.join(".vscode").join("cspell.json"));

        let active = find_active_config(root).unwrap();
        assert!(active.ends_with(".vscode/cspell.json"));
    }

    #[cfg(any(target_os = "macos", windows))]
    #[test]
    fn test_find_active_reports_on_disk_spelling() {
        let temp_dir = TempDir::new().unwrap();
        let reported = temp_dir.path().join("cSpell.json");
        touch(&reported);

        // `cspell.json` comes first in the catalog and opens the same file
        assert_eq!(find_active_config(temp_dir.path()), Some(paths::normalize(&reported)));
    }

    #[test]
    fn test_find_active_ignores_directories() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("cspell.json")).unwrap();

        assert!(find_active_config(temp_dir.path()).is_none());
    }

    #[test]
    fn test_search_root_for_container_entry() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let nested = root.join(".config").join("cspell.yml");
        touch(&nested);

        assert_eq!(search_root_for(&nested), Some(paths::normalize_dir(root)));
        assert_eq!(
            search_root_for(&root.join("cspell.json")),
            Some(paths::normalize_dir(root))
        );
        assert_eq!(search_root_for(&root.join("notes.txt")), None);
    }

    #[test]
    fn test_compute_search_roots_unions_sources() {
        let temp_dir = TempDir::new().unwrap();
        let project = temp_dir.path().join("project");
        let docs = project.join("docs");
        let dicts = temp_dir.path().join("shared-dicts");
        fs::create_dir_all(&docs).unwrap();
        fs::create_dir_all(&dicts).unwrap();

        let source = SearchPaths::new(vec![PathBuf::from("docs"), PathBuf::from("missing")]);
        let roots = compute_search_roots(&project, &source, vec![dicts.join("words.txt")]);

        assert_eq!(roots.len(), 3);
        assert!(roots.contains(&paths::normalize_dir(&project)));
        assert!(roots.contains(&paths::normalize_dir(&docs)));
        assert!(roots.contains(&paths::normalize_dir(&dicts)));
    }

    #[test]
    fn test_search_paths_can_be_replaced() {
        let source = SearchPaths::new(vec![PathBuf::from("a")]);
        source.set(vec![PathBuf::from("b"), PathBuf::from("c")]);
        assert_eq!(
            source.custom_search_paths(),
            vec![PathBuf::from("b"), PathBuf::from("c")]
        );
    }
}
