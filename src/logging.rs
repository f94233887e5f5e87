// src/logging.rs

//! Logging setup for `bashq` using `tracing` + `tracing-subscriber`.
//!
//! The filter comes from the `--log-level` flag when given. Otherwise
//! `BASHQ_LOG` is read as a full `EnvFilter` directive string
//! (e.g. `"info"` or `"bashq::engine=debug,warn"`), and `info` applies when
//! it is unset.
//!
//! Logs go to STDERR; STDOUT carries the JSON results.

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "BASHQ_LOG";

/// Initialise the global logging subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = build_filter(cli_level, std::env::var(LOG_ENV_VAR).ok().as_deref())?;

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to install log subscriber: {e}"))
}

/// Pick the filter: CLI level, then the env directives, then `info`.
pub fn build_filter(cli_level: Option<LogLevel>, env_value: Option<&str>) -> Result<EnvFilter> {
    if let Some(level) = cli_level {
        return Ok(EnvFilter::new(directive(level)));
    }
    match env_value.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => EnvFilter::try_new(raw)
            .map_err(|e| anyhow!("invalid {LOG_ENV_VAR} value {raw:?}: {e}")),
        None => Ok(EnvFilter::new("info")),
    }
}

fn directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}
