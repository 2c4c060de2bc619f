//! CLI argument parsing with clap
//!
//! This module defines the command-line interface structure using clap,
//! including all commands, arguments, and their documentation.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Environment;

/// Inspect and edit the match log cache
#[derive(Parser, Debug)]
#[command(name = "matchlog-cache")]
#[command(about = "Inspect and edit the match log cache")]
#[command(long_about = "
matchlog-cache reads and writes the cache used by the match log processing
service: raw log sets, player mappings, rendered match pages and cached
processing failures. Results are printed as JSON.

EXAMPLES:
    # List the match ids that have stored log sets
    matchlog-cache keys matches

    # Show the log set for match 1234
    matchlog-cache logs get 1234

    # Check whether match 1234 failed recently
    matchlog-cache error check 1234

    # Store one match page under three log ids
    matchlog-cache match set page.json 3100200 3100201 3100202

    # Use a specific configuration file
    matchlog-cache --config /etc/matchlog/cache.toml ping
")]
#[command(version = crate::clap_long_version())]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    ///
    /// Load this TOML file instead of the layered `config/` directory.
    #[arg(short, long, value_name = "FILE", value_parser = super::validation::validate_config_file_path)]
    pub config: Option<PathBuf>,

    /// Override environment detection
    ///
    /// Selects which `{environment}.toml` is layered over `default.toml`.
    /// Available values: development (dev), test, staging (stage), production (prod)
    #[arg(short, long)]
    pub env: Option<Environment>,

    /// Enable verbose logging (debug level)
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check that the store is reachable
    Ping,

    /// List every field in a bucket (matches, players or logs)
    Keys {
        /// Bucket name
        bucket: String,
    },

    /// Log sets keyed by match id
    Logs {
        #[command(subcommand)]
        action: LogsAction,
    },

    /// Cached processing failures keyed by match id
    Error {
        #[command(subcommand)]
        action: ErrorAction,
    },

    /// Player id to steam id mappings
    Player {
        #[command(subcommand)]
        action: PlayerAction,
    },

    /// Match pages keyed by log id
    Match {
        #[command(subcommand)]
        action: MatchAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum LogsAction {
    /// Print the stored log set
    Get {
        #[arg(allow_negative_numbers = true)]
        match_id: i64,
    },

    /// Store a log set read from a JSON file
    Set {
        #[arg(allow_negative_numbers = true)]
        match_id: i64,
        #[arg(value_parser = super::validation::validate_input_file_path)]
        file: PathBuf,
    },

    /// Remove the log set and print what was removed
    Delete {
        #[arg(allow_negative_numbers = true)]
        match_id: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum ErrorAction {
    /// Exit non-zero if a failure is cached for the match
    Check {
        #[arg(allow_negative_numbers = true)]
        match_id: i64,
    },

    /// Record a failure for the match
    Set {
        #[arg(allow_negative_numbers = true)]
        match_id: i64,
        message: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum PlayerAction {
    /// Print the steam id for a player
    Get { player_id: String },

    /// Map a player to a steam id
    Set { player_id: String, steam_id: String },
}

#[derive(Subcommand, Debug)]
pub enum MatchAction {
    /// Print the match page for a log id
    Get {
        #[arg(allow_negative_numbers = true)]
        log_id: i64,
    },

    /// Store a match page read from a JSON file under each log id
    Set {
        #[arg(value_parser = super::validation::validate_input_file_path)]
        file: PathBuf,
        #[arg(required = true, num_args = 1.., allow_negative_numbers = true)]
        log_ids: Vec<i64>,
    },
}
