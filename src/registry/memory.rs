// src/registry/memory.rs

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use super::state::RegistryState;
use super::{Registry, RegistryResult};
use crate::types::{ChangeRecord, NewChange, ResourceId, ResourceSummary};

/// Registry that keeps everything in memory (lost on restart).
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    state: Mutex<RegistryState>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl Registry for MemoryRegistry {
    fn insert_resource(&self, locator: &str) -> RegistryResult<ResourceId> {
        self.state().insert_resource(locator)
    }

    fn list_resources(&self) -> RegistryResult<Vec<ResourceSummary>> {
        Ok(self.state().summaries())
    }

    fn get_last_content(&self, id: ResourceId) -> RegistryResult<Option<String>> {
        Ok(self.state().resource(id)?.last_content.clone())
    }

    fn set_last_content(&self, id: ResourceId, content: &str) -> RegistryResult<()> {
        self.state().set_last_content(id, content)
    }

    fn append_history(
        &self,
        id: ResourceId,
        timestamp: DateTime<Utc>,
        patch: Option<&str>,
    ) -> RegistryResult<()> {
        self.state().append_history(id, timestamp, patch)
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
        self.state().record_check(id, content, change)
    }
}
