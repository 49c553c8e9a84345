//! CLI argument parsing using clap.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

#[derive(Parser)]
#[command(
    name = "cspell-watch",
    version,
    about = "Track active cspell configuration files and their combined word list",
    styles = clap_cargo_style()
)]
pub struct Cli {
    /// Settings file to use instead of searching for .cspell-watch/settings.toml
    #[arg(short, long, global = true, env = "CSPELL_WATCH_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up .cspell-watch directory with default settings
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Display active settings
    Config,

    /// List recognized configuration file locations in priority order
    Catalog,

    /// Show the active configuration file of every search root
    Resolve {
        /// Project root (defaults to settings or current directory)
        dir: Option<PathBuf>,
    },

    /// Print the combined word list
    Words {
        /// Project root (defaults to settings or current directory)
        dir: Option<PathBuf>,
    },

    /// Watch for changes and report every update of the word list
    Watch {
        /// Project root (defaults to settings or current directory)
        dir: Option<PathBuf>,

        /// Debounce delay in milliseconds (overrides settings)
        #[arg(long)]
        debounce_ms: Option<u64>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_watch_with_overrides() {
        let cli = Cli::try_parse_from(["cspell-watch", "watch", "/tmp/p", "--debounce-ms", "50"])
            .unwrap();
        match cli.command {
            Commands::Watch { dir, debounce_ms } => {
                assert_eq!(dir, Some(PathBuf::from("/tmp/p")));
                assert_eq!(debounce_ms, Some(50));
            }
            _ => panic!("expected watch"),
        }
    }
}
