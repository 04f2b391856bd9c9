// src/registry/mod.rs

//! Durable store of tracked resources and their change history.
//!
//! - [`state`] holds the plain data model shared by every backend.
//! - [`memory`] keeps that state in memory only.
//! - [`file`] persists it as a JSON document through [`crate::fs::FileSystem`].
//!
//! The registry is the only shared mutable state in the pipeline. Callers
//! that read-compare-write a snapshot are expected to serialise per resource
//! (see [`crate::recorder::KeyedLocks`]); the registry itself only guarantees
//! that each call is atomic.

use std::fmt::Debug;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::info;

use crate::errors::RegistryError;
use crate::fs::RealFileSystem;
use crate::types::{ChangeRecord, NewChange, ResourceId, ResourceSummary, StorageBackend};

pub mod file;
pub mod memory;
pub mod state;

pub use file::FileRegistry;
pub use memory::MemoryRegistry;

pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

pub trait Registry: Send + Sync + Debug {
    /// Register a new locator. Rejects duplicates instead of overwriting.
    fn insert_resource(&self, locator: &str) -> RegistryResult<ResourceId>;

    /// Point-in-time list of every tracked resource.
    fn list_resources(&self) -> RegistryResult<Vec<ResourceSummary>>;

    fn get_last_content(&self, id: ResourceId) -> RegistryResult<Option<String>>;

    fn set_last_content(&self, id: ResourceId, content: &str) -> RegistryResult<()>;

    fn append_history(
        &self,
        id: ResourceId,
        timestamp: DateTime<Utc>,
        patch: Option<&str>,
    ) -> RegistryResult<()>;

    /// Change records of one resource, newest first.
    fn list_history(&self, id: ResourceId) -> RegistryResult<Vec<ChangeRecord>>;

    /// Commit the outcome of one check cycle: the new snapshot plus, when a
    /// change was detected, one history row.
    ///
    /// Backends override this to apply both writes as a single unit.
    fn record_check(
        &self,
        id: ResourceId,
        content: &str,
        change: Option<&NewChange>,
    ) -> RegistryResult<()> {
        if let Some(change) = change {
            self.append_history(id, change.timestamp, Some(&change.patch))?;
        }
        self.set_last_content(id, content)
    }
}

/// Shape check applied on registration. The locator is stored verbatim.
pub fn validate_locator(locator: &str) -> RegistryResult<()> {
    static LOCATOR: OnceLock<Regex> = OnceLock::new();
    let re = LOCATOR.get_or_init(|| Regex::new(r"(?i)^https?://\S+$").expect("valid locator regex"));

    if re.is_match(locator) {
        Ok(())
    } else {
        Err(RegistryError::InvalidLocator(locator.to_string()))
    }
}

/// Open the registry backend selected in the config.
///
/// Failure here is the one process-fatal storage condition.
pub fn open_registry(backend: StorageBackend, path: &Path) -> RegistryResult<Arc<dyn Registry>> {
    match backend {
        StorageBackend::Memory => {
            info!("using in-memory registry (state is lost on exit)");
            Ok(Arc::new(MemoryRegistry::new()))
        }
        StorageBackend::File => {
            let registry = FileRegistry::open(Arc::new(RealFileSystem), path)?;
            info!(path = %path.display(), "opened file registry");
            Ok(Arc::new(registry))
        }
    }
}
