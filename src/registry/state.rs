// src/registry/state.rs

//! Plain registry data model, independent of where it is stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{validate_locator, RegistryResult};
use crate::errors::RegistryError;
use crate::types::{content_digest, ChangeRecord, NewChange, ResourceId, ResourceSummary};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRow {
    pub id: ResourceId,
    pub locator: String,
    #[serde(default)]
    pub last_content: Option<String>,
    #[serde(default)]
    pub last_digest: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRow {
    pub id: u64,
    pub resource_id: ResourceId,
    pub timestamp: DateTime<Utc>,
    pub patch: Option<String>,
}

/// Every resource and history row, plus id counters.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegistryState {
    #[serde(default)]
    next_resource_id: u64,
    #[serde(default)]
    next_history_id: u64,
    #[serde(default)]
    resources: Vec<ResourceRow>,
    #[serde(default)]
    history: Vec<HistoryRow>,
}

impl RegistryState {
    pub fn insert_resource(&mut self, locator: &str) -> RegistryResult<ResourceId> {
        validate_locator(locator)?;

        if self.resources.iter().any(|r| r.locator == locator) {
            return Err(RegistryError::DuplicateLocator(locator.to_string()));
        }

        // Ids start at 1 and never get reused, even after a reload.
        let last_used = self.resources.iter().map(|r| r.id.0).max().unwrap_or(0);
        let id = ResourceId(self.next_resource_id.max(last_used) + 1);
        self.next_resource_id = id.0;

        self.resources.push(ResourceRow {
            id,
            locator: locator.to_string(),
            last_content: None,
            last_digest: None,
        });
        Ok(id)
    }

    pub fn summaries(&self) -> Vec<ResourceSummary> {
        self.resources
            .iter()
            .map(|r| ResourceSummary {
                id: r.id,
                locator: r.locator.clone(),
                last_digest: r.last_digest.clone(),
            })
            .collect()
    }

    pub fn resource(&self, id: ResourceId) -> RegistryResult<&ResourceRow> {
        self.resources
            .iter()
            .find(|r| r.id == id)
            .ok_or(RegistryError::NotFound(id))
    }

    fn resource_mut(&mut self, id: ResourceId) -> RegistryResult<&mut ResourceRow> {
        self.resources
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(RegistryError::NotFound(id))
    }

    pub fn set_last_content(&mut self, id: ResourceId, content: &str) -> RegistryResult<()> {
        let row = self.resource_mut(id)?;
        row.last_digest = Some(content_digest(content));
        row.last_content = Some(content.to_string());
        Ok(())
    }

    pub fn append_history(
        &mut self,
        id: ResourceId,
        timestamp: DateTime<Utc>,
        patch: Option<&str>,
    ) -> RegistryResult<()> {
        self.resource(id)?;

        let last_used = self.history.iter().map(|h| h.id).max().unwrap_or(0);
        let history_id = self.next_history_id.max(last_used) + 1;
        self.next_history_id = history_id;

        // Never earlier than this resource's newest record, even if the
        // wall clock stepped back.
        let timestamp = self
            .history
            .iter()
            .filter(|h| h.resource_id == id)
            .map(|h| h.timestamp)
            .max()
            .map_or(timestamp, |newest| newest.max(timestamp));

        self.history.push(HistoryRow {
            id: history_id,
            resource_id: id,
            timestamp,
            patch: patch.map(str::to_string),
        });
        Ok(())
    }

    /// Apply a check cycle's writes. Validates before touching anything, so
    /// an error leaves the state as it was.
    pub fn record_check(
        &mut self,
        id: ResourceId,
        content: &str,
        change: Option<&NewChange>,
    ) -> RegistryResult<()> {
        self.resource(id)?;
        if let Some(change) = change {
            self.append_history(id, change.timestamp, Some(&change.patch))?;
        }
        self.set_last_content(id, content)
    }

    /// History of `id`, newest first; equal timestamps fall back to insertion order.
    /// An unknown id simply has no history.
    pub fn history_for(&self, id: ResourceId) -> RegistryResult<Vec<ChangeRecord>> {
        let mut rows: Vec<&HistoryRow> =
            self.history.iter().filter(|h| h.resource_id == id).collect();
        rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));

        Ok(rows
            .into_iter()
            .map(|h| ChangeRecord {
                resource_id: h.resource_id,
                timestamp: h.timestamp,
                patch: h.patch.clone(),
            })
            .collect())
    }
}
