//! The fixed, ordered table of recognized cspell configuration locations.
//!
//! Position in [`CATALOG`] is priority: index 0 wins over everything else.
//! Users' on-disk layouts depend on this order, so entries must never be
//! reordered or removed silently.

use std::path::Path;

/// Hidden containers that may hold any catalog file name.
pub const HIDDEN_CONTAINERS: &[&str] = &[".config", ".vscode"];

/// Generic container that only recognizes [`GENERIC_CONTAINER_FILE`].
pub const GENERIC_CONTAINER: &str = "config";

/// The single file name recognized inside [`GENERIC_CONTAINER`].
pub const GENERIC_CONTAINER_FILE: &str = "cspell.yml";

/// Manifest that may embed a `cspell` section. Lowest priority.
pub const MANIFEST_FILE: &str = "package.json";

/// One recognized configuration location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Relative path pattern: a bare file name or `<container>/<file name>`.
    pub key: &'static str,
    /// Search root is the container's parent rather than the container.
    pub container_relative: bool,
}

impl CatalogEntry {
    const fn root(key: &'static str) -> Self {
        Self {
            key,
            container_relative: false,
        }
    }

    const fn nested(key: &'static str) -> Self {
        Self {
            key,
            container_relative: true,
        }
    }

    /// File name component of the key.
    pub fn file_name(&self) -> &'static str {
        self.key.rsplit('/').next().unwrap_or(self.key)
    }

    /// Whether this is the manifest-style entry.
    pub fn is_manifest(&self) -> bool {
        self.key == MANIFEST_FILE
    }
}

/// All recognized locations in priority order.
pub static CATALOG: &[CatalogEntry] = &[
    CatalogEntry::root(".cspell.json"),
    CatalogEntry::root("cspell.json"),
    CatalogEntry::root(".cSpell.json"),
    CatalogEntry::root("cSpell.json"),
    CatalogEntry::root(".cspell.jsonc"),
    CatalogEntry::root("cspell.jsonc"),
    CatalogEntry::root(".cspell.config.json"),
    CatalogEntry::root("cspell.config.json"),
    CatalogEntry::root(".cspell.config.jsonc"),
    CatalogEntry::root("cspell.config.jsonc"),
    CatalogEntry::root(".cspell.yaml"),
    CatalogEntry::root("cspell.yaml"),
    CatalogEntry::root(".cspell.yml"),
    CatalogEntry::root("cspell.yml"),
    CatalogEntry::root(".cspell.config.yaml"),
    CatalogEntry::root("cspell.config.yaml"),
    CatalogEntry::root(".cspell.config.yml"),
    CatalogEntry::root("cspell.config.yml"),
    CatalogEntry::root(".cspell.config.mjs"),
    CatalogEntry::root("cspell.config.mjs"),
    CatalogEntry::root(".cspell.config.cjs"),
    CatalogEntry::root("cspell.config.cjs"),
    CatalogEntry::root(".cspell.config.js"),
    CatalogEntry::root("cspell.config.js"),
    CatalogEntry::root(".cspell.config.toml"),
    CatalogEntry::root("cspell.config.toml"),
    CatalogEntry::nested(".config/.cspell.json"),
    CatalogEntry::nested(".config/cspell.json"),
    CatalogEntry::nested(".config/.cSpell.json"),
    CatalogEntry::nested(".config/cSpell.json"),
    CatalogEntry::nested(".config/.cspell.jsonc"),
    CatalogEntry::nested(".config/cspell.jsonc"),
    CatalogEntry::nested(".config/cspell.config.json"),
    CatalogEntry::nested(".config/cspell.config.jsonc"),
    CatalogEntry::nested(".config/cspell.yaml"),
    CatalogEntry::nested(".config/cspell.yml"),
    CatalogEntry::nested(".config/cspell.config.yaml"),
    CatalogEntry::nested(".config/cspell.config.yml"),
    CatalogEntry::nested(".config/cspell.config.mjs"),
    CatalogEntry::nested(".config/cspell.config.cjs"),
    CatalogEntry::nested(".config/cspell.config.js"),
    CatalogEntry::nested(".config/cspell.config.toml"),
    CatalogEntry::nested("config/cspell.yml"),
    CatalogEntry::nested(".vscode/cspell.json"),
    CatalogEntry::nested(".vscode/cSpell.json"),
    CatalogEntry::nested(".vscode/.cspell.json"),
    CatalogEntry::root(MANIFEST_FILE),
];

/// Normalize a file path to its catalog key by looking at the immediate
/// parent directory name.
///
/// Returns `None` when the path has no file name.
pub fn catalog_key(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    let parent_name = path
        .parent()
        .and_then(Path::file_name)
        .and_then(|name| name.to_str());

    let key = match parent_name {
        Some(container) if HIDDEN_CONTAINERS.contains(&container) => {
            format!("{container}/{file_name}")
        }
        Some(GENERIC_CONTAINER) if file_name == GENERIC_CONTAINER_FILE => {
            format!("{GENERIC_CONTAINER}/{file_name}")
        }
        _ => file_name.to_string(),
    };
    Some(key)
}

/// Index of `key` in the catalog.
pub fn index_of(key: &str) -> Option<usize> {
    CATALOG.iter().position(|entry| entry.key == key)
}

/// Catalog entry and index for a file path.
pub fn lookup(path: &Path) -> Option<(usize, &'static CatalogEntry)> {
    let key = catalog_key(path)?;
    let index = index_of(&key)?;
    Some((index, &CATALOG[index]))
}

/// A path is a configuration file iff its key is in the catalog.
pub fn is_config_path(path: &Path) -> bool {
    lookup(path).is_some()
}

/// Priority rank of a path. Unrecognized paths rank last (`usize::MAX`).
pub fn rank(path: &Path) -> usize {
    lookup(path).map(|(index, _)| index).unwrap_or(usize::MAX)
}

/// True iff `a` strictly outranks `b`.
pub fn has_higher_priority(a: &Path, b: &Path) -> bool {
    rank(a) < rank(b)
}

/// Whether any catalog entry uses `file_name`, regardless of container.
///
/// Cheap pre-filter for raw file-system events.
pub fn is_candidate_file_name(file_name: &str) -> bool {
    CATALOG.iter().any(|entry| entry.file_name() == file_name)
}
