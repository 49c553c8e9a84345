//! Locating a Node.js interpreter for JavaScript configuration files.
//!
//! Order: the configured executable (if it exists and is executable), then
//! every `node` on `PATH`, then well-known install locations of common
//! version managers. A successful discovery is cached; a failed one is
//! retried on the next lookup so a Node installed later is found.
//!
//! Executables are returned as found, never through their symlink target:
//! version-manager shims (Volta) pick the tool from the name they were
//! started under.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use parking_lot::RwLock;

use super::ParseError;

#[cfg(windows)]
const NODE_BINARY: &str = "node.exe";
#[cfg(not(windows))]
const NODE_BINARY: &str = "node";

#[derive(Debug)]
pub struct NodeLocator {
    configured: RwLock<Option<PathBuf>>,
    discovered: RwLock<Option<PathBuf>>,
    timeout: Duration,
}

impl NodeLocator {
    pub fn new(configured: Option<PathBuf>, timeout_ms: u64) -> Self {
        Self {
            configured: RwLock::new(configured),
            discovered: RwLock::new(None),
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    /// Replace the user-configured executable (settings reload).
    pub fn set_configured(&self, executable: Option<PathBuf>) {
        *self.configured.write() = executable;
    }

    /// Limit for a single evaluation.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Executable to run, or why there is none.
    pub fn locate(&self) -> Result<PathBuf, ParseError> {
        self.locate_with(discover)
    }

    fn locate_with(&self, discover: impl FnOnce() -> Vec<PathBuf>) -> Result<PathBuf, ParseError> {
        if let Some(configured) = self.configured.read().clone() {
            if is_executable(&configured) {
                return Ok(configured);
            }
            tracing::warn!(
                "[node] configured executable {} is not usable, falling back to discovery",
                configured.display()
            );
        }

        if let Some(cached) = self.discovered.read().clone() {
            return Ok(cached);
        }

        let found = discover()
            .into_iter()
            .next()
            .ok_or_else(|| ParseError::NodeUnavailable {
                reason: "no `node` on PATH or in common install locations; set node.executable"
                    .to_string(),
            })?;
        *self.discovered.write() = Some(found.clone());
        Ok(found)
    }
}

impl Default for NodeLocator {
    fn default() -> Self {
        Self::new(None, 5_000)
    }
}

/// All usable Node.js executables, PATH entries first, without duplicates.
pub fn discover() -> Vec<PathBuf> {
    let on_path = which::which_all(NODE_BINARY)
        .map(|iter| iter.collect::<Vec<_>>())
        .unwrap_or_default();

    let candidates = on_path
        .into_iter()
        .chain(well_known_dirs().into_iter().map(|dir| dir.join(NODE_BINARY)));

    let found = usable_executables(candidates);
    crate::debug_event!("node", "discovered", "{} executables", found.len());
    found
}

/// Executable candidates in order, skipping any whose symlink target was
/// already seen. The path kept is the one found, not the target.
fn usable_executables(candidates: impl IntoIterator<Item = PathBuf>) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut found = Vec::new();
    for candidate in candidates {
        if !is_executable(&candidate) {
            continue;
        }
        let target = std::fs::canonicalize(&candidate).unwrap_or_else(|_| candidate.clone());
        if seen.insert(target) {
            found.push(candidate);
        }
    }
    found
}

fn well_known_dirs() -> Vec<PathBuf> {
    let mut out = Vec::new();
    let home = dirs::home_dir();

    if let Ok(volta) = std::env::var("VOLTA_HOME") {
        out.push(PathBuf::from(volta).join("bin"));
    } else if let Some(home) = &home {
        out.push(home.join(".volta").join("bin"));
    }

    if cfg!(windows) {
        for var in ["ProgramFiles", "ProgramFiles(x86)"] {
            if let Ok(base) = std::env::var(var) {
                out.push(PathBuf::from(base).join("nodejs"));
            }
        }
        for var in ["NVM_HOME", "NVM_SYMLINK"] {
            if let Ok(dir) = std::env::var(var) {
                out.push(PathBuf::from(dir));
            }
        }
        if let Some(data) = dirs::data_dir() {
            out.push(data.join("fnm").join("aliases").join("default"));
        }
        out.push(PathBuf::from(r"C:\ProgramData\chocolatey\bin"));
        if let Some(home) = &home {
            out.push(home.join("scoop").join("apps").join("nodejs").join("current").join("bin"));
        }
    } else {
        out.push(PathBuf::from("/usr/local/bin"));
        out.push(PathBuf::from("/usr/bin"));
        out.push(PathBuf::from("/opt/homebrew/bin"));
        if let Some(home) = &home {
            out.push(home.join(".local").join("bin"));
            out.push(home.join(".nvm").join("current").join("bin"));
            out.push(
                home.join(".local")
                    .join("share")
                    .join("fnm")
                    .join("aliases")
                    .join("default")
                    .join("bin"),
            );
        }
        if let Ok(nvm_bin) = std::env::var("NVM_BIN") {
            out.push(PathBuf::from(nvm_bin));
        }
    }

    out
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_configured_executable_is_not_used() {
        let locator = NodeLocator::new(Some(PathBuf::from("/definitely/not/node")), 1_000);
        // Falls through to discovery; whatever it finds, it is not the bogus path
        if let Ok(found) = locator.locate() {
            assert_ne!(found, PathBuf::from("/definitely/not/node"));
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_configured_executable_wins() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let fake = temp_dir.path().join("node");
        std::fs::write(&fake, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&fake, std::fs::Permissions::from_mode(0o755)).unwrap();

        let locator = NodeLocator::new(Some(fake.clone()), 1_000);
        assert_eq!(locator.locate().unwrap(), fake);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_executable_file_is_rejected() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let fake = temp_dir.path().join("node");
        std::fs::write(&fake, "").unwrap();
        std::fs::set_permissions(&fake, std::fs::Permissions::from_mode(0o644)).unwrap();

        assert!(!is_executable(&fake));
    }

    #[cfg(unix)]
    #[test]
    fn test_shim_symlinks_are_kept_as_found() {
        use std::os::unix::fs::{PermissionsExt, symlink};

        let temp_dir = TempDir::new().unwrap();
        let bin = temp_dir.path().join("bin");
        let other = temp_dir.path().join("other");
        std::fs::create_dir_all(&bin).unwrap();
        std::fs::create_dir_all(&other).unwrap();

        let shim = bin.join("volta-shim");
        std::fs::write(&shim, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&shim, std::fs::Permissions::from_mode(0o755)).unwrap();
        symlink(&shim, bin.join("node")).unwrap();
        symlink(&shim, other.join("node")).unwrap();

        let found = usable_executables([
            bin.join("node"),
            temp_dir.path().join("missing").join("node"),
            other.join("node"),
        ]);
        assert_eq!(found, vec![bin.join("node")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_discovery_is_retried() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let fake = temp_dir.path().join("node");
        std::fs::write(&fake, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&fake, std::fs::Permissions::from_mode(0o755)).unwrap();

        let locator = NodeLocator::new(None, 1_000);
        assert!(matches!(
            locator.locate_with(Vec::new),
            Err(ParseError::NodeUnavailable { .. })
        ));
        assert_eq!(locator.locate_with(|| vec![fake.clone()]).unwrap(), fake);
        // Cached once found
        assert_eq!(locator.locate_with(Vec::new).unwrap(), fake);
    }

    #[test]
    fn test_timeout_from_millis() {
        assert_eq!(NodeLocator::new(None, 250).timeout(), Duration::from_millis(250));
    }
}
