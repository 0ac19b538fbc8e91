//! CLI module for Watchpost.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Watchpost - Question answering over video analysis reports
///
/// Fetches the latest analysis report from a bucket, indexes it and answers
/// questions about suspicious activity grounded in the report.
#[derive(Parser, Debug)]
#[command(name = "watchpost")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch the latest report and rebuild the index
    Refresh,

    /// Ask a question about the latest report
    Ask {
        /// The question to ask
        question: String,

        /// Number of report excerpts to use as context
        #[arg(short, long)]
        k: Option<usize>,

        /// Refresh the report before answering
        #[arg(short, long)]
        refresh: bool,

        /// LLM model to use for answer generation
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Search the report for relevant excerpts
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long)]
        k: Option<usize>,
    },

    /// Start an interactive question session
    Chat {
        /// LLM model to use
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Show the persisted index
    Status,

    /// List recordings in the bucket, oldest first
    Media {
        /// Folder prefix to list (defaults to storage.media_prefix)
        #[arg(short, long)]
        prefix: Option<String>,
    },

    /// Download a recording or the report
    Download {
        /// Object name in the bucket
        name: String,

        /// Output file (defaults to the data directory)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ask() {
        let cli = Cli::parse_from(["watchpost", "ask", "Who entered the cage?", "-k", "2", "--refresh"]);
        match cli.command {
            Commands::Ask { question, k, refresh, model } => {
                assert_eq!(question, "Who entered the cage?");
                assert_eq!(k, Some(2));
                assert!(refresh);
                assert!(model.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["watchpost", "media", "-vv", "--config", "/tmp/w.toml"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config.as_deref(), Some("/tmp/w.toml"));
        assert!(matches!(cli.command, Commands::Media { prefix: None }));
    }
}
