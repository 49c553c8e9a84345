//! Resolve command.

use std::path::PathBuf;

use crate::config::Settings;

use super::Session;

/// Print each search root with its active configuration file.
pub async fn run(settings: &Settings, dir: Option<PathBuf>) -> anyhow::Result<()> {
    let session = Session::open(settings, dir)?;
    session.registry.initialize().await?;

    let active = session.registry.active_files();
    for root in session.registry.search_roots() {
        match active.get(&root) {
            Some(config) => println!("{}\n  -> {}", root.display(), config.display()),
            None => println!("{}\n  -> (none)", root.display()),
        }
    }

    session.registry.shutdown();
    Ok(())
}
