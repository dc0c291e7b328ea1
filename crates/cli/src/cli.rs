//! Command-line definitions.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Match a music catalog against MusicBrainz.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (missing file means defaults)
    #[arg(short, long, env = "TUNEBRIDGE_CONFIG", default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Match a JSON array of source entities
    Match {
        /// Kind of entity in the input file
        #[arg(value_enum)]
        kind: EntityArg,
        /// JSON file containing an array of source entities
        #[arg(short, long)]
        input: PathBuf,
        /// Where to write the results (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print Prometheus metrics to stderr when done
        #[arg(long)]
        metrics: bool,
    },
    /// Match cache maintenance
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
pub enum CacheAction {
    /// Show entry counts and age range
    Stats,
    /// Remove every entry
    Clear,
    /// Remove entries older than N days
    Evict {
        /// Age in days (default: cache.retention_days)
        #[arg(long)]
        days: Option<u32>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EntityArg {
    Tracks,
    Albums,
    Artists,
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
    fn test_parse_match_command() {
        let cli = Cli::try_parse_from([
            "tunebridge",
            "--config",
            "/etc/tunebridge.toml",
            "match",
            "albums",
            "--input",
            "albums.json",
            "--metrics",
        ])
        .unwrap();

        assert_eq!(cli.config, PathBuf::from("/etc/tunebridge.toml"));
        match cli.command {
            Commands::Match {
                kind,
                input,
                output,
                metrics,
            } => {
                assert_eq!(kind, EntityArg::Albums);
                assert_eq!(input, PathBuf::from("albums.json"));
                assert!(output.is_none());
                assert!(metrics);
            }
            _ => panic!("expected match command"),
        }
    }

    #[test]
    fn test_parse_cache_evict() {
        let cli = Cli::try_parse_from(["tunebridge", "cache", "evict", "--days", "7"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Cache {
                action: CacheAction::Evict { days: Some(7) }
            }
        ));
    }
}
