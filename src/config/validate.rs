// src/config/validate.rs

use std::time::Duration;

use crate::config::model::{ConfigFile, RawConfigFile, ServiceSettings, StoreMode};
use crate::errors::{BashqError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = BashqError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_service(&raw)?;
        let poll_interval = parse_interval("timing.poll_interval", &raw.timing.poll_interval)?;
        let output_flush_interval = parse_interval(
            "timing.output_flush_interval",
            &raw.timing.output_flush_interval,
        )?;
        let store = store_mode(&raw)?;

        let max_output_bytes = raw
            .service
            .max_output_bytes
            .map(|limit| usize::try_from(limit).unwrap_or(usize::MAX));

        Ok(ConfigFile {
            settings: ServiceSettings {
                max_concurrent: raw.service.max_concurrent,
                shell: raw.service.shell.trim().to_string(),
                max_output_bytes,
                poll_interval,
                output_flush_interval,
            },
            store,
        })
    }
}

fn validate_service(cfg: &RawConfigFile) -> Result<()> {
    if cfg.service.max_concurrent == 0 {
        return Err(BashqError::ConfigError(
            "[service].max_concurrent must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.service.shell.trim().is_empty() {
        return Err(BashqError::ConfigError(
            "[service].shell must not be empty".to_string(),
        ));
    }
    if cfg.service.max_output_bytes == Some(0) {
        return Err(BashqError::ConfigError(
            "[service].max_output_bytes must be >= 1 when set".to_string(),
        ));
    }
    Ok(())
}

fn parse_interval(key: &str, value: &str) -> Result<Duration> {
    let duration = parse_duration(value)
        .map_err(|e| BashqError::ConfigError(format!("[{key}]: {e}")))?;
    if duration.is_zero() {
        return Err(BashqError::ConfigError(format!(
            "[{key}] must be greater than zero"
        )));
    }
    Ok(duration)
}

fn store_mode(cfg: &RawConfigFile) -> Result<StoreMode> {
    match cfg.store.mode.trim().to_lowercase().as_str() {
        "memory" => Ok(StoreMode::Memory),
        "file" => Ok(StoreMode::File(cfg.store.path.clone())),
        other => Err(BashqError::ConfigError(format!(
            "invalid [store].mode: {other} (expected \"memory\" or \"file\")"
        ))),
    }
}

/// Parse durations of the form `<digits><unit>` with unit `ms`, `s`, `m`
/// or `h`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    let secs_per_unit = match unit.as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        _ => {
            return Err(format!(
                "unsupported duration unit '{}'; expected ms, s, m, or h",
                unit
            ));
        }
    };
    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{}' is too large", s))
}
