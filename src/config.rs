//! Layered settings for the watcher.
//!
//! Sources, lowest precedence first:
//! - compiled defaults
//! - `.cspell-watch/settings.toml` (searched from the current directory upwards)
//! - environment variables
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `CSW_` and use double underscores
//! to separate nested levels:
//! - `CSW_WATCHER__DEBOUNCE_MS=200` sets `watcher.debounce_ms`
//! - `CSW_NODE__EXECUTABLE=/opt/node/bin/node` sets `node.executable`
//! - `CSW_LOGGING__DEFAULT=debug` sets `logging.default`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Name of the per-project settings directory.
pub const LOCAL_DIR: &str = ".cspell-watch";

/// Settings file name inside [`LOCAL_DIR`].
pub const SETTINGS_FILE: &str = "settings.toml";

const ENV_PREFIX: &str = "CSW_";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Project root. Detected from the settings location when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_root: Option<PathBuf>,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub watcher: WatcherConfig,

    #[serde(default)]
    pub node: NodeConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct SearchConfig {
    /// Extra directories that may hold their own cspell configuration.
    /// Relative entries are resolved against the project root.
    #[serde(default)]
    pub custom_paths: Vec<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WatcherConfig {
    /// Quiet period before a burst of edits to one file is reloaded
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NodeConfig {
    /// Node.js executable used for `cspell.config.{js,cjs,mjs}`.
    /// Discovered on PATH and common install locations when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executable: Option<PathBuf>,

    /// Upper bound for one Node.js evaluation
    #[serde(default = "default_node_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default level for every target
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-target overrides, e.g. `cspell_watch = "debug"`
    #[serde(default)]
    pub modules: BTreeMap<String, String>,
}

fn default_version() -> u32 {
    1
}
fn default_debounce_ms() -> u64 {
    500
}
fn default_node_timeout_ms() -> u64 {
    5_000
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            project_root: None,
            search: SearchConfig::default(),
            watcher: WatcherConfig::default(),
            node: NodeConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            executable: None,
            timeout_ms: default_node_timeout_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources, searching upwards from the
    /// current directory for the settings file.
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(LOCAL_DIR).join(SETTINGS_FILE));

        Self::load_from(config_path).map(|mut settings| {
            if settings.project_root.is_none() {
                settings.project_root = Self::workspace_root();
            }
            settings
        })
    }

    /// Load configuration from a specific file plus the environment.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            // `__` separates nesting levels; single `_` stays inside field names
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(Box::new)
    }

    /// Find the settings file by looking for the local directory from the
    /// current directory up to the filesystem root.
    pub fn find_workspace_config() -> Option<PathBuf> {
        Self::workspace_root().map(|root| root.join(LOCAL_DIR).join(SETTINGS_FILE))
    }

    /// Directory containing [`LOCAL_DIR`], if any.
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        current
            .ancestors()
            .find(|ancestor| ancestor.join(LOCAL_DIR).is_dir())
            .map(Path::to_path_buf)
    }

    /// Effective project root: configured value, else the current directory.
    pub fn resolved_project_root(&self) -> PathBuf {
        self.project_root
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Custom search paths made absolute against `project_root`.
    pub fn resolved_custom_paths(&self, project_root: &Path) -> Vec<PathBuf> {
        self.search
            .custom_paths
            .iter()
            .map(|p| {
                if p.is_absolute() {
                    p.clone()
                } else {
                    project_root.join(p)
                }
            })
            .collect()
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file under `dir`.
    pub fn init_config_file(dir: &Path, force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = dir.join(LOCAL_DIR).join(SETTINGS_FILE);

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        Settings::default().save(&config_path)?;
        Ok(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.version, 1);
        assert_eq!(settings.watcher.debounce_ms, 500);
        assert_eq!(settings.node.timeout_ms, 5_000);
        assert!(settings.node.executable.is_none());
        assert!(settings.search.custom_paths.is_empty());
        assert_eq!(settings.logging.default, "warn");
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");

        let toml_content = r#"
version = 2

[search]
custom_paths = ["packages/app", "/abs/docs"]

[watcher]
debounce_ms = 120

[node]
executable = "/opt/node/bin/node"

[logging.modules]
cspell_watch = "debug"
"#;

        fs::write(&config_path, toml_content).unwrap();

        let settings = Settings::load_from(&config_path).unwrap();
        assert_eq!(settings.version, 2);
        assert_eq!(settings.watcher.debounce_ms, 120);
        assert_eq!(
            settings.node.executable,
            Some(PathBuf::from("/opt/node/bin/node"))
        );
        // Unspecified values keep their defaults
        assert_eq!(settings.node.timeout_ms, 5_000);
        assert_eq!(settings.logging.default, "warn");
        assert_eq!(settings.logging.modules["cspell_watch"], "debug");

        let root = Path::new("/work");
        let resolved = settings.resolved_custom_paths(root);
        assert_eq!(
            resolved,
            vec![PathBuf::from("/work/packages/app"), PathBuf::from("/abs/docs")]
        );
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("settings.toml");

        let mut settings = Settings::default();
        settings.watcher.debounce_ms = 42;
        settings.search.custom_paths = vec![PathBuf::from("docs")];

        settings.save(&config_path).unwrap();

        let loaded = Settings::load_from(&config_path).unwrap();
        assert_eq!(loaded.watcher.debounce_ms, 42);
        assert_eq!(loaded.search.custom_paths, vec![PathBuf::from("docs")]);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let settings = Settings::load_from(temp_dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings.watcher.debounce_ms, 500);
    }

    #[test]
    fn test_init_config_file_refuses_overwrite() {
        let temp_dir = TempDir::new().unwrap();

        let path = Settings::init_config_file(temp_dir.path(), false).unwrap();
        assert!(path.ends_with(".cspell-watch/settings.toml"));
        assert!(path.exists());

        assert!(Settings::init_config_file(temp_dir.path(), false).is_err());
        assert!(Settings::init_config_file(temp_dir.path(), true).is_ok());
    }
}
