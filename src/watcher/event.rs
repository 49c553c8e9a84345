//! Pre-classified file-system events consumed by the registry.

use std::path::{Path, PathBuf};

/// One file-system change, with absolute paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileEvent {
    Created(PathBuf),
    ContentChanged(PathBuf),
    Deleted(PathBuf),
    /// Moved to another location, possibly another directory.
    Moved { from: PathBuf, to: PathBuf },
    /// Copied; the source still exists.
    Copied { from: PathBuf, to: PathBuf },
    /// Renamed in place (same directory, new file name).
    Renamed { from: PathBuf, to: PathBuf },
}

/// Elementary transition an event decomposes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change<'a> {
    Created(&'a Path),
    ContentChanged(&'a Path),
    Deleted(&'a Path),
}

impl FileEvent {
    /// Decompose into elementary changes, in the order they apply.
    ///
    /// Moves and renames become a deletion of the old path followed by a
    /// creation of the new one. A copy only creates the new path.
    pub fn changes(&self) -> Vec<Change<'_>> {
        match self {
            FileEvent::Created(path) => vec![Change::Created(path)],
            FileEvent::ContentChanged(path) => vec![Change::ContentChanged(path)],
            FileEvent::Deleted(path) => vec![Change::Deleted(path)],
            FileEvent::Moved { from, to } | FileEvent::Renamed { from, to } => {
                vec![Change::Deleted(from), Change::Created(to)]
            }
            FileEvent::Copied { to, .. } => vec![Change::Created(to)],
        }
    }

    /// Every path the event touches.
    pub fn paths(&self) -> Vec<&Path> {
        match self {
            FileEvent::Created(path) | FileEvent::ContentChanged(path) | FileEvent::Deleted(path) => {
                vec![path]
            }
            FileEvent::Moved { from, to }
            | FileEvent::Copied { from, to }
            | FileEvent::Renamed { from, to } => vec![from, to],
        }
    }
}
