use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable identifier of a tracked resource, assigned on registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(pub u64);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ResourceId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(ResourceId)
            .map_err(|e| format!("invalid resource id {s:?}: {e}"))
    }
}

/// The `{id, locator}` pair handed out by `list_resources`.
///
/// This is what a sweep dispatches on; the snapshot itself is always re-read
/// from the registry inside the per-resource critical section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSummary {
    pub id: ResourceId,
    pub locator: String,
    /// blake3 digest of the last snapshot, if one was ever committed.
    #[serde(default)]
    pub last_digest: Option<String>,
}

/// One detected material change, as returned by `list_history`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub resource_id: ResourceId,
    pub timestamp: DateTime<Utc>,
    pub patch: Option<String>,
}

/// A history row about to be appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChange {
    pub timestamp: DateTime<Utc>,
    pub patch: String,
}

/// Where the registry keeps its state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// JSON document on disk (survives restarts).
    File,
    /// In memory only (lost on restart).
    Memory,
}

impl Default for StorageBackend {
    fn default() -> Self {
        StorageBackend::File
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::File => f.write_str("file"),
            StorageBackend::Memory => f.write_str("memory"),
        }
    }
}

/// blake3 digest of a snapshot, hex encoded.
pub fn content_digest(content: &str) -> String {
    blake3::hash(content.as_bytes()).to_hex().to_string()
}
