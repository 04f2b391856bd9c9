// src/recorder/mod.rs

//! One check cycle for one tracked resource: fetch, compare, decide, persist.
//!
//! The whole cycle runs under the resource's entry in [`KeyedLocks`], so two
//! cycles for the same resource (e.g. from overlapping sweeps) compose
//! sequentially: the second one compares against what the first committed.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::diff;
use crate::errors::{FetchError, RegistryError};
use crate::fetch::Fetcher;
use crate::registry::Registry;
use crate::types::{NewChange, ResourceSummary};

pub mod locks;

pub use locks::KeyedLocks;

/// What a single check cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// First successful fetch; snapshot stored, no history row.
    Baseline,
    /// Content identical to the stored snapshot; snapshot rewritten.
    Unchanged,
    /// Content differs; history row appended and snapshot replaced.
    Changed,
    /// Nothing was written.
    FetchFailed(FetchError),
    /// Nothing was written.
    StorageFailed(RegistryError),
}

impl CheckOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            CheckOutcome::FetchFailed(_) | CheckOutcome::StorageFailed(_)
        )
    }
}

#[derive(Debug, Clone)]
pub struct ChangeRecorder {
    registry: Arc<dyn Registry>,
    fetcher: Arc<dyn Fetcher>,
    clock: Arc<dyn Clock>,
    locks: KeyedLocks,
    fetch_timeout: Duration,
}

impl ChangeRecorder {
    pub fn new(
        registry: Arc<dyn Registry>,
        fetcher: Arc<dyn Fetcher>,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            fetcher,
            clock: Arc::new(SystemClock),
            locks: KeyedLocks::new(),
            fetch_timeout,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn registry(&self) -> &Arc<dyn Registry> {
        &self.registry
    }

    pub fn locks(&self) -> &KeyedLocks {
        &self.locks
    }

    /// Run one check cycle for `resource`. Never fails; the outcome says
    /// whether anything was committed.
    pub async fn check(&self, resource: &ResourceSummary) -> CheckOutcome {
        let _guard = self.locks.acquire(resource.id).await;

        let current = match self.fetch_bounded(&resource.locator).await {
            Ok(body) => body,
            Err(err) => {
                warn!(
                    resource_id = %resource.id,
                    locator = %resource.locator,
                    error = %err,
                    "fetch failed; leaving snapshot and history untouched"
                );
                return CheckOutcome::FetchFailed(err);
            }
        };

        // Storage work (serialising, fsync) runs off the async workers; the
        // resource guard stays held until it finishes.
        let committed = {
            let recorder = self.clone();
            let resource = resource.clone();
            tokio::task::spawn_blocking(move || recorder.commit(&resource, &current))
                .await
                .unwrap_or_else(|join_err| {
                    Err(RegistryError::Storage(format!(
                        "commit task did not finish: {join_err}"
                    )))
                })
        };

        match committed {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(
                    resource_id = %resource.id,
                    locator = %resource.locator,
                    error = %err,
                    "storage failed; check cycle aborted"
                );
                CheckOutcome::StorageFailed(err)
            }
        }
    }

    async fn fetch_bounded(&self, locator: &str) -> Result<String, FetchError> {
        match tokio::time::timeout(self.fetch_timeout, self.fetcher.fetch(locator)).await {
            Ok(result) => result,
            Err(_elapsed) => Err(FetchError::Timeout {
                locator: locator.to_string(),
                after: self.fetch_timeout,
            }),
        }
    }

    /// Read the committed snapshot, compare, and write back as one unit.
    fn commit(&self, resource: &ResourceSummary, current: &str) -> Result<CheckOutcome, RegistryError> {
        let previous = self.registry.get_last_content(resource.id)?;
        let comparison = diff::compare(previous.as_deref(), current);

        let (outcome, change) = match (previous.is_some(), comparison.patch) {
            (false, _) => (CheckOutcome::Baseline, None),
            (true, Some(patch)) => {
                let change = NewChange {
                    timestamp: self.clock.now(),
                    patch,
                };
                (CheckOutcome::Changed, Some(change))
            }
            (true, _) => (CheckOutcome::Unchanged, None),
        };

        self.registry
            .record_check(resource.id, current, change.as_ref())?;

        match &outcome {
            CheckOutcome::Baseline => info!(
                resource_id = %resource.id,
                locator = %resource.locator,
                "first check; stored baseline snapshot"
            ),
            CheckOutcome::Changed => info!(
                resource_id = %resource.id,
                locator = %resource.locator,
                "changes detected"
            ),
            _ => debug!(
                resource_id = %resource.id,
                locator = %resource.locator,
                "no changes"
            ),
        }

        Ok(outcome)
    }
}
