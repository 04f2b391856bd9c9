// src/errors.rs

//! Crate-wide error aliases and helpers.
//!
//! Three failure families flow through the pipeline:
//! - [`FetchError`]: the page could not be retrieved. Recovered per resource.
//! - [`RegistryError`]: a registration was rejected or storage failed.
//! - [`PagewatchError`]: startup / CLI level errors (config, IO, storage init).

use std::time::Duration;

use thiserror::Error;

use crate::types::ResourceId;

#[derive(Error, Debug)]
pub enum PagewatchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Why a single fetch attempt did not produce content.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("transport error fetching {locator}: {message}")]
    Transport { locator: String, message: String },

    #[error("fetching {locator} timed out after {after:?}")]
    Timeout { locator: String, after: Duration },

    #[error("fetching {locator} returned HTTP status {status}")]
    Status { locator: String, status: u16 },

    #[error("reading response body of {locator} failed: {message}")]
    Body { locator: String, message: String },
}

impl FetchError {
    pub fn locator(&self) -> &str {
        match self {
            FetchError::Transport { locator, .. }
            | FetchError::Timeout { locator, .. }
            | FetchError::Status { locator, .. }
            | FetchError::Body { locator, .. } => locator,
        }
    }
}

/// Errors surfaced by a [`Registry`](crate::registry::Registry).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("locator already tracked: {0}")]
    DuplicateLocator(String),

    #[error("invalid locator: {0:?} (expected an http:// or https:// URL)")]
    InvalidLocator(String),

    #[error("resource not found: {0}")]
    NotFound(ResourceId),

    #[error("storage failure: {0}")]
    Storage(String),
}

impl RegistryError {
    pub fn storage(err: impl std::fmt::Display) -> Self {
        RegistryError::Storage(err.to_string())
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, PagewatchError>;
