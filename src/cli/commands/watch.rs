//! Watch command.

use std::path::PathBuf;

use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use crate::config::Settings;
use crate::paths;
use crate::watcher::FsWatcher;
use crate::words::WordSetEvent;

use super::Session;

/// Watch until Ctrl-C, printing the size of every published word set.
pub async fn run(
    settings: &Settings,
    settings_path: Option<PathBuf>,
    dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    let session = Session::open(settings, dir)?;
    let mut updates = session.words.subscribe();

    session.registry.initialize().await?;
    println!(
        "Watching {} search roots ({} words)",
        session.registry.search_roots().len(),
        session.words.len()
    );

    let mut builder = FsWatcher::builder()
        .registry(session.registry.clone())
        .search_paths(session.search_paths.clone())
        .node(session.node.clone());
    if let Some(path) = settings_path {
        builder = builder.settings_path(paths::normalize(&path));
    }
    let watcher = builder.build()?;

    let ct = CancellationToken::new();
    let watch_task = tokio::spawn(watcher.watch(ct.clone()));

    let words = session.words.clone();
    let printer = tokio::spawn(async move {
        loop {
            match updates.recv().await {
                Ok(WordSetEvent::Replaced { count }) => {
                    println!("word list updated: {count} words");
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("[watch] skipped {skipped} updates");
                    println!("word list updated: {} words", words.len());
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    eprintln!("Received shutdown signal");
    ct.cancel();

    let result = watch_task.await?;
    printer.abort();
    result?;
    Ok(())
}
