// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Environment variable consulted when no `--config` flag is given.
pub const CONFIG_ENV_VAR: &str = "BASHQ_CONFIG";

/// Load a configuration file and return the raw, unvalidated model.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file and validate it.
///
/// This is the entry point the rest of the crate uses:
///
/// - Reads TOML.
/// - Applies defaults for missing sections.
/// - Parses durations and the store mode.
/// - Rejects a zero concurrency ceiling and other nonsensical values.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Resolve the config file to use.
///
/// Explicit path first, then `BASHQ_CONFIG`, then `Bashq.toml` in the
/// working directory. Returns `None` when nothing was requested and the
/// default file does not exist, in which case built-in defaults apply.
pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(PathBuf::from(path));
    }
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    let default = default_config_path();
    default.is_file().then_some(default)
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("Bashq.toml")
}
