#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use pagewatch::clock::ManualClock;
use pagewatch::fetch::MockFetcher;
use pagewatch::recorder::ChangeRecorder;
use pagewatch::registry::{MemoryRegistry, Registry};
use pagewatch::types::{ResourceId, ResourceSummary};

/// In-memory pipeline: memory registry + scripted fetcher + manual clock.
pub struct Pipeline {
    pub registry: Arc<MemoryRegistry>,
    pub fetcher: MockFetcher,
    pub clock: ManualClock,
    pub recorder: Arc<ChangeRecorder>,
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 7, 0, 0).unwrap()
}

impl Pipeline {
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(5))
    }

    pub fn with_timeout(fetch_timeout: Duration) -> Self {
        Self::with_registry(Arc::new(MemoryRegistry::new()), fetch_timeout)
    }

    pub fn with_registry(registry: Arc<MemoryRegistry>, fetch_timeout: Duration) -> Self {
        let fetcher = MockFetcher::new();
        let clock = ManualClock::new(start_time());
        let recorder = ChangeRecorder::new(
            registry.clone(),
            Arc::new(fetcher.clone()),
            fetch_timeout,
        )
        .with_clock(Arc::new(clock.clone()));

        Self {
            registry,
            fetcher,
            clock,
            recorder: Arc::new(recorder),
        }
    }

    /// Register `locator` and return its summary as a sweep would see it.
    pub fn track(&self, locator: &str) -> ResourceSummary {
        let id = self.registry.insert_resource(locator).unwrap();
        self.summary(id)
    }

    pub fn summary(&self, id: ResourceId) -> ResourceSummary {
        self.registry
            .list_resources()
            .unwrap()
            .into_iter()
            .find(|r| r.id == id)
            .expect("resource registered")
    }

    pub fn last_content(&self, id: ResourceId) -> Option<String> {
        self.registry.get_last_content(id).unwrap()
    }

    pub fn history_len(&self, id: ResourceId) -> usize {
        self.registry.list_history(id).unwrap().len()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
