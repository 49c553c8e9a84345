//! Words command.

use std::path::PathBuf;

use crate::config::Settings;

use super::Session;

/// Print the combined word list, sorted, one word per line.
pub async fn run(settings: &Settings, dir: Option<PathBuf>) -> anyhow::Result<()> {
    let session = Session::open(settings, dir)?;
    session.registry.initialize().await?;

    for word in session.words.sorted() {
        println!("{word}");
    }
    crate::log_event!("words", "total", "{}", session.words.len());

    session.registry.shutdown();
    Ok(())
}
