//! CLI interface for Gauge
//!
//! Command-line interface built with clap's derive API: global flags plus the
//! interview, serve, catalog and config commands.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Gauge adaptive skills interviewer
///
/// Runs adaptive Excel skills interviews backed by a language model, either
/// interactively in the terminal or as an HTTP API.
#[derive(Parser, Debug)]
#[command(name = "gauge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run an interview in the terminal
    Interview {
        /// Candidate name
        #[arg(short, long)]
        name: String,

        /// Position level (beginner, intermediate, advanced)
        #[arg(short, long, default_value = "intermediate")]
        level: String,
    },

    /// Serve the HTTP API
    Serve {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show levels, plans and question budgets
    Catalog,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Print the configuration file path
    Path,
}
