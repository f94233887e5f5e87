// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `bashq`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "bashq",
    version,
    about = "Run shell scripts under a concurrency ceiling, queueing the overflow.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Falls back to `BASHQ_CONFIG`, then `Bashq.toml` if present, then
    /// built-in defaults.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BASHQ_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Submit through the sudo path, which allows `sudo` in scripts.
    #[arg(long)]
    pub sudo: bool,

    /// Print stored commands and the queue as JSON, then exit.
    #[arg(long)]
    pub list: bool,

    /// Scripts to submit; each one becomes a command.
    #[arg(value_name = "SCRIPT")]
    pub scripts: Vec<String>,
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
