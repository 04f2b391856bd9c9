// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

use crate::types::ResourceId;

/// Command-line arguments for `pagewatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "pagewatch",
    version,
    about = "Track web pages and keep a history of what changed.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Pagewatch.toml` in the current working directory. If that
    /// file does not exist, built-in defaults are used.
    #[arg(long, value_name = "PATH", default_value = "Pagewatch.toml", global = true)]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PAGEWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the scheduler: sweep every tracked page on the configured cadence.
    Run {
        /// Run a single sweep now and exit when every check has finished.
        #[arg(long)]
        once: bool,

        /// Also run a sweep immediately at startup.
        #[arg(long, conflicts_with = "once")]
        sweep_on_start: bool,
    },

    /// Start tracking a page.
    Add {
        /// The page URL, stored exactly as given.
        url: String,
    },

    /// List tracked pages.
    List,

    /// Show the change history of a tracked page, newest first.
    History {
        /// Resource id as printed by `add` / `list`.
        id: ResourceId,
    },

    /// Parse + validate the config and print the upcoming sweep times.
    Config,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
