// src/config/validate.rs

use std::time::Duration;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{PagewatchError, Result};
use crate::schedule::Cadence;
use crate::types::StorageBackend;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::PagewatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let cadence = validate_schedule(&raw)?;
        let fetch_timeout = validate_fetch(&raw)?;
        validate_storage(&raw)?;
        Ok(ConfigFile::new_unchecked(raw, cadence, fetch_timeout))
    }
}

fn validate_schedule(cfg: &RawConfigFile) -> Result<Cadence> {
    Cadence::parse(&cfg.schedule.cron, &cfg.schedule.timezone)
        .map_err(|e| PagewatchError::ConfigError(format!("[schedule]: {e}")))
}

fn validate_fetch(cfg: &RawConfigFile) -> Result<Duration> {
    let timeout = parse_duration(&cfg.fetch.timeout)
        .map_err(|e| PagewatchError::ConfigError(format!("[fetch].timeout: {e}")))?;

    if timeout.is_zero() {
        return Err(PagewatchError::ConfigError(
            "[fetch].timeout must be greater than zero".to_string(),
        ));
    }

    if cfg.fetch.user_agent.trim().is_empty() {
        return Err(PagewatchError::ConfigError(
            "[fetch].user_agent must not be empty".to_string(),
        ));
    }

    Ok(timeout)
}

fn validate_storage(cfg: &RawConfigFile) -> Result<()> {
    if cfg.storage.backend == StorageBackend::File && cfg.storage.path.as_os_str().is_empty() {
        return Err(PagewatchError::ConfigError(
            "[storage].path must be set when backend = \"file\"".to_string(),
        ));
    }
    Ok(())
}

/// Very small duration parser for strings like `"500ms"`, `"3s"`, `"2m"`, `"1h"`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;

    let unit = unit_part.trim();
    let seconds_per_unit = match unit {
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
        .checked_mul(seconds_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{}' is too large", s))
}
