// src/config/model.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::schedule::Cadence;
use crate::types::StorageBackend;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [schedule]
/// cron = "0 0 * * *"
/// timezone = "America/Los_Angeles"
///
/// [fetch]
/// timeout = "30s"
/// user_agent = "pagewatch/0.1"
///
/// [storage]
/// backend = "file"
/// path = "pagewatch.json"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub schedule: ScheduleSection,

    #[serde(default)]
    pub fetch: FetchSection,

    #[serde(default)]
    pub storage: StorageSection,
}

/// `[schedule]` section: when sweeps fire.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleSection {
    /// Cron expression, 5-field (minute first) or 6/7-field (seconds first).
    #[serde(default = "default_cron")]
    pub cron: String,

    /// IANA time zone the expression is evaluated in.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_cron() -> String {
    "0 0 * * *".to_string()
}

fn default_timezone() -> String {
    "America/Los_Angeles".to_string()
}

impl Default for ScheduleSection {
    fn default() -> Self {
        Self {
            cron: default_cron(),
            timezone: default_timezone(),
        }
    }
}

/// `[fetch]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FetchSection {
    /// Upper bound on a single fetch, e.g. `"30s"` or `"500ms"`.
    #[serde(default = "default_timeout")]
    pub timeout: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout() -> String {
    "30s".to_string()
}

fn default_user_agent() -> String {
    concat!("pagewatch/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for FetchSection {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// `[storage]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageSection {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Registry document for the `file` backend.
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("pagewatch.json")
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_storage_path(),
        }
    }
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>`, so the parsed cadence
/// and timeout are always consistent with the raw sections.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub schedule: ScheduleSection,
    pub fetch: FetchSection,
    pub storage: StorageSection,
    cadence: Cadence,
    fetch_timeout: Duration,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        raw: RawConfigFile,
        cadence: Cadence,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            schedule: raw.schedule,
            fetch: raw.fetch,
            storage: raw.storage,
            cadence,
            fetch_timeout,
        }
    }

    pub fn cadence(&self) -> &Cadence {
        &self.cadence
    }

    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.storage.backend
    }

    pub fn storage_path(&self) -> &Path {
        &self.storage.path
    }
}
