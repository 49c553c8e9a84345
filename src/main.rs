use clap::Parser;

use cspell_watch::cli::commands;
use cspell_watch::cli::{Cli, Commands};
use cspell_watch::config::Settings;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load configuration
    let loaded = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    let mut settings = loaded.unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        Settings::default()
    });

    cspell_watch::logging::init_with_config(&settings.logging);

    let settings_path = cli.config.clone().or_else(Settings::find_workspace_config);

    let result = match cli.command {
        Commands::Init { force } => commands::init::run_init(force),
        Commands::Config => commands::init::run_config(&settings),
        Commands::Catalog => commands::catalog::run(),
        Commands::Resolve { dir } => commands::resolve::run(&settings, dir).await,
        Commands::Words { dir } => commands::words::run(&settings, dir).await,
        Commands::Watch { dir, debounce_ms } => {
            if let Some(ms) = debounce_ms {
                settings.watcher.debounce_ms = ms;
            }
            commands::watch::run(&settings, settings_path, dir).await
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
