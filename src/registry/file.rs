// src/registry/file.rs

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::state::RegistryState;
use super::{Registry, RegistryResult};
use crate::errors::RegistryError;
use crate::fs::FileSystem;
use crate::types::{ChangeRecord, NewChange, ResourceId, ResourceSummary};

/// Registry persisted as a single JSON document.
///
/// Every mutation is applied to a copy of the state, written to
/// `<path>.tmp`, renamed over `<path>`, and only then published. A failed
/// write leaves both the file and the in-memory state untouched.
#[derive(Debug)]
pub struct FileRegistry {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
    state: Mutex<RegistryState>,
}

impl FileRegistry {
    /// Load the document at `path`, creating an empty one if it is missing.
    pub fn open(fs: Arc<dyn FileSystem>, path: impl AsRef<Path>) -> RegistryResult<Self> {
        let path = path.as_ref().to_path_buf();

        let state = if fs.exists(&path) {
            let raw = fs.read_to_string(&path).map_err(RegistryError::storage)?;
            let state: RegistryState = serde_json::from_str(&raw).map_err(|e| {
                RegistryError::Storage(format!("parsing registry file {:?}: {e}", path))
            })?;
            debug!(path = %path.display(), "loaded registry document");
            state
        } else {
            info!(path = %path.display(), "creating new registry document");
            let state = RegistryState::default();
            persist(fs.as_ref(), &path, &state)?;
            state
        };

        Ok(Self {
            fs,
            path,
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn state(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn mutate<T>(
        &self,
        f: impl FnOnce(&mut RegistryState) -> RegistryResult<T>,
    ) -> RegistryResult<T> {
        let mut guard = self.state();
        let mut next = guard.clone();
        let out = f(&mut next)?;
        persist(self.fs.as_ref(), &self.path, &next)?;
        *guard = next;
        Ok(out)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn persist(fs: &dyn FileSystem, path: &Path, state: &RegistryState) -> RegistryResult<()> {
    let json = serde_json::to_vec_pretty(state).map_err(RegistryError::storage)?;
    let tmp = temp_path(path);
    fs.write(&tmp, &json).map_err(RegistryError::storage)?;
    fs.rename(&tmp, path).map_err(RegistryError::storage)?;
    Ok(())
}

impl Registry for FileRegistry {
    fn insert_resource(&self, locator: &str) -> RegistryResult<ResourceId> {
        self.mutate(|s| s.insert_resource(locator))
    }

    fn list_resources(&self) -> RegistryResult<Vec<ResourceSummary>> {
        Ok(self.state().summaries())
    }

    fn get_last_content(&self, id: ResourceId) -> RegistryResult<Option<String>> {
        Ok(self.state().resource(id)?.last_content.clone())
    }

    fn set_last_content(&self, id: ResourceId, content: &str) -> RegistryResult<()> {
        self.mutate(|s| s.set_last_content(id, content))
    }

    fn append_history(
        &self,
        id: ResourceId,
        timestamp: DateTime<Utc>,
        patch: Option<&str>,
    ) -> RegistryResult<()> {
        self.mutate(|s| s.append_history(id, timestamp, patch))
    }

    fn list_history(&self, id: ResourceId) -> RegistryResult<Vec<ChangeRecord>> {
        self.state().history_for(id)
    }

    fn record_check(
        &self,
        id: ResourceId,
        content: &str,
        change: Option<&NewChange>,
    ) -> RegistryResult<()> {
        self.mutate(|s| s.record_check(id, content, change))
    }
}
