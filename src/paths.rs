//! Path canonicalization used for every map key.
//!
//! All registries are keyed by the output of [`normalize`] (files) or
//! [`normalize_dir`] (search roots), so two spellings
//! of one physical file (symlinked directories, `..` segments, `/var` vs
//! `/private/var` on macOS) map to one key. On case-insensitive file
//! systems an existing file is keyed by the spelling stored on disk, which
//! is the spelling file watchers report.

use std::ffi::{OsStr, OsString};
use std::path::{Component, Path, PathBuf};

/// Canonical key for a file path.
///
/// The parent directory is canonicalized (see [`normalize_dir`]) and the
/// file name re-attached, using its on-disk spelling when the file exists.
/// This gives the same key for a file before and after it is deleted, and
/// keeps a symlinked config file keyed at the location it was found rather
/// than at its target.
pub fn normalize(path: &Path) -> PathBuf {
    let absolute = absolutize(path);
    match absolute.parent() {
        Some(parent) => match absolute.file_name() {
            Some(name) => {
                let parent = normalize_dir(parent);
                let name = on_disk_name(&parent, name);
                parent.join(name)
            }
            None => absolute,
        },
        None => absolute,
    }
}

/// Name of the entry in `dir` that `name` opens.
///
/// Differs from `name` only when the file system matched it
/// case-insensitively.
fn on_disk_name(dir: &Path, name: &OsStr) -> OsString {
    if !dir.join(name).exists() {
        return name.to_os_string();
    }
    let Ok(entries) = std::fs::read_dir(dir) else {
        return name.to_os_string();
    };

    let mut folded = None;
    for entry in entries.flatten() {
        let entry_name = entry.file_name();
        if entry_name == name {
            return entry_name;
        }
        if folded.is_none() && eq_ignore_case(&entry_name, name) {
            folded = Some(entry_name);
        }
    }
    folded.unwrap_or_else(|| name.to_os_string())
}

fn eq_ignore_case(a: &OsStr, b: &OsStr) -> bool {
    match (a.to_str(), b.to_str()) {
        (Some(a), Some(b)) => a.to_lowercase() == b.to_lowercase(),
        _ => false,
    }
}

/// Canonical key for a directory.
///
/// When the directory is gone (a whole `.vscode/` removed at once), the
/// deepest existing ancestor is canonicalized and the missing tail
/// re-attached lexically.
pub fn normalize_dir(path: &Path) -> PathBuf {
    let absolute = absolutize(path);
    if let Ok(canonical) = dunce_canonicalize(&absolute) {
        return canonical;
    }

    let mut tail = Vec::new();
    let mut current = absolute.as_path();
    while let Some(parent) = current.parent() {
        if let Some(name) = current.file_name() {
            tail.push(name.to_os_string());
        }
        if let Ok(mut canonical) = dunce_canonicalize(parent) {
            for name in tail.iter().rev() {
                canonical.push(name);
            }
            return canonical;
        }
        current = parent;
    }
    absolute
}

/// Absolute, lexically cleaned path without touching the file system.
pub fn absolutize(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    clean(&joined)
}

/// Drop `.` segments and fold `..` against the preceding component.
pub fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() && !out.has_root() {
                    out.push(component.as_os_str());
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// `std::fs::canonicalize` without the `\\?\` verbatim prefix on Windows,
/// so keys stay comparable with paths reported by file watchers.
fn dunce_canonicalize(path: &Path) -> std::io::Result<PathBuf> {
    let canonical = std::fs::canonicalize(path)?;
    #[cfg(windows)]
    {
        if let Some(stripped) = canonical.to_str().and_then(|s| s.strip_prefix(r"\\?\")) {
            if !stripped.starts_with("UNC") {
                return Ok(PathBuf::from(stripped));
            }
        }
    }
    Ok(canonical)
}
