#![allow(dead_code)]

use std::path::PathBuf;

use pagewatch::config::{ConfigFile, RawConfigFile};
use pagewatch::types::StorageBackend;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn cron(mut self, expression: &str) -> Self {
        self.config.schedule.cron = expression.to_string();
        self
    }

    pub fn timezone(mut self, tz: &str) -> Self {
        self.config.schedule.timezone = tz.to_string();
        self
    }

    pub fn fetch_timeout(mut self, timeout: &str) -> Self {
        self.config.fetch.timeout = timeout.to_string();
        self
    }

    pub fn memory_storage(mut self) -> Self {
        self.config.storage.backend = StorageBackend::Memory;
        self
    }

    pub fn file_storage(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.storage.backend = StorageBackend::File;
        self.config.storage.path = path.into();
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
