//! Command implementations for the CLI.
//!
//! Each command is implemented in its own module.

pub mod catalog;
pub mod init;
pub mod resolve;
pub mod watch;
pub mod words;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use crate::config::Settings;
use crate::parsers::{NodeLocator, ParserSet};
use crate::resolver::SearchPaths;
use crate::watcher::ActiveConfigRegistry;
use crate::words::SharedWordSet;

/// Everything a command needs to drive a registry.
pub struct Session {
    pub registry: ActiveConfigRegistry,
    pub words: Arc<SharedWordSet>,
    pub search_paths: Arc<SearchPaths>,
    pub node: Arc<NodeLocator>,
}

impl Session {
    /// Build a registry for `dir`, or for the settings' project root.
    pub fn open(settings: &Settings, dir: Option<PathBuf>) -> anyhow::Result<Self> {
        let project_root = dir.unwrap_or_else(|| settings.resolved_project_root());
        anyhow::ensure!(
            project_root.is_dir(),
            "project root {} is not a directory",
            project_root.display()
        );

        let search_paths = Arc::new(SearchPaths::new(
            settings.resolved_custom_paths(&project_root),
        ));
        let node = Arc::new(NodeLocator::new(
            settings.node.executable.clone(),
            settings.node.timeout_ms,
        ));
        let words = Arc::new(SharedWordSet::default());

        let registry = ActiveConfigRegistry::builder()
            .project_root(project_root)
            .search_paths(search_paths.clone())
            .parsers(ParserSet::new(node.clone()))
            .sink(words.clone())
            .debounce_ms(settings.watcher.debounce_ms)
            .build()
            .context("failed to create registry")?;

        Ok(Self {
            registry,
            words,
            search_paths,
            node,
        })
    }
}
