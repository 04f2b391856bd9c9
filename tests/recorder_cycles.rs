// tests/recorder_cycles.rs

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use pagewatch::errors::{FetchError, RegistryError};
use pagewatch::fs::mock::MockFileSystem;
use pagewatch::recorder::{ChangeRecorder, CheckOutcome};
use pagewatch::registry::{FileRegistry, Registry, RegistryResult};
use pagewatch::types::{ChangeRecord, NewChange, ResourceId, ResourceSummary};
use pagewatch_test_utils::harness::{start_time, Pipeline};
use pagewatch_test_utils::{init_tracing, with_timeout, with_timeout_of};

const URL: &str = "https://x.test/page";

#[tokio::test]
async fn first_cycle_only_establishes_baseline() {
    init_tracing();
    let p = Pipeline::new();
    let resource = p.track(URL);
    p.fetcher.set_page(URL, "hello\nworld\n");

    let outcome = p.recorder.check(&resource).await;

    assert_eq!(outcome, CheckOutcome::Baseline);
    assert_eq!(p.last_content(resource.id).as_deref(), Some("hello\nworld\n"));
    assert_eq!(p.history_len(resource.id), 0);
}

#[tokio::test]
async fn identical_content_is_not_a_change() {
    init_tracing();
    let p = Pipeline::new();
    let resource = p.track(URL);
    p.fetcher.set_page(URL, "A");

    assert_eq!(p.recorder.check(&resource).await, CheckOutcome::Baseline);
    assert_eq!(p.recorder.check(&resource).await, CheckOutcome::Unchanged);

    assert_eq!(p.history_len(resource.id), 0);
    assert_eq!(p.last_content(resource.id).as_deref(), Some("A"));
}

#[tokio::test]
async fn changed_line_appends_one_record_with_hunk() {
    init_tracing();
    let p = Pipeline::new();
    let resource = p.track(URL);

    p.fetcher.set_page(URL, "A\nB");
    p.recorder.check(&resource).await;

    p.clock.advance(ChronoDuration::hours(24));
    p.fetcher.set_page(URL, "A\nC");
    assert_eq!(p.recorder.check(&resource).await, CheckOutcome::Changed);

    let history = p.registry.list_history(resource.id).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].resource_id, resource.id);
    assert_eq!(history[0].timestamp, start_time() + ChronoDuration::hours(24));

    let patch = history[0].patch.as_deref().unwrap();
    assert!(patch.contains("@@ -1,2 +1,2 @@"), "patch was:\n{patch}");
    assert!(patch.contains("-B"));
    assert!(patch.contains("+C"));
}

#[tokio::test]
async fn snapshot_advances_on_every_successful_fetch() {
    init_tracing();
    let p = Pipeline::new();
    let resource = p.track(URL);

    for body in ["one", "one", "two", "three", "three"] {
        p.fetcher.set_page(URL, body);
        p.recorder.check(&resource).await;
        assert_eq!(p.last_content(resource.id).as_deref(), Some(body));
    }
    assert_eq!(p.history_len(resource.id), 2);
}

#[tokio::test]
async fn failed_fetch_mutates_nothing() {
    init_tracing();
    let p = Pipeline::new();
    let resource = p.track(URL);

    p.fetcher.set_page(URL, "stable");
    p.recorder.check(&resource).await;

    let err = FetchError::Status {
        locator: URL.to_string(),
        status: 503,
    };
    p.fetcher.set_failure(URL, err.clone());
    assert_eq!(p.recorder.check(&resource).await, CheckOutcome::FetchFailed(err));

    assert_eq!(p.last_content(resource.id).as_deref(), Some("stable"));
    assert_eq!(p.history_len(resource.id), 0);

    // Retried next time round; the failure was not taken as "no change".
    p.fetcher.set_page(URL, "moved on");
    assert_eq!(p.recorder.check(&resource).await, CheckOutcome::Changed);
}

#[tokio::test]
async fn failed_first_fetch_leaves_snapshot_absent() {
    init_tracing();
    let p = Pipeline::new();
    let resource = p.track(URL);
    p.fetcher.set_failure(
        URL,
        FetchError::Transport {
            locator: URL.to_string(),
            message: "connection refused".to_string(),
        },
    );

    assert!(p.recorder.check(&resource).await.is_failure());
    assert_eq!(p.last_content(resource.id), None);

    p.fetcher.set_page(URL, "finally");
    assert_eq!(p.recorder.check(&resource).await, CheckOutcome::Baseline);
}

#[tokio::test]
async fn hung_fetch_is_cut_off_by_timeout() {
    init_tracing();
    let p = Pipeline::with_timeout(Duration::from_millis(50));
    let resource = p.track(URL);
    p.fetcher.set_page(URL, "never arrives");
    p.fetcher.set_delay(URL, Duration::from_secs(30));

    let outcome = with_timeout(p.recorder.check(&resource)).await;

    assert!(matches!(
        outcome,
        CheckOutcome::FetchFailed(FetchError::Timeout { .. })
    ));
    assert_eq!(p.last_content(resource.id), None);
}

#[tokio::test]
async fn storage_failure_mutates_nothing() {
    init_tracing();
    let fs = MockFileSystem::new();
    let registry: Arc<dyn Registry> =
        Arc::new(FileRegistry::open(Arc::new(fs.clone()), "/db.json").unwrap());
    let id = registry.insert_resource(URL).unwrap();
    registry.set_last_content(id, "old").unwrap();

    let fetcher = pagewatch::fetch::MockFetcher::new();
    fetcher.set_page(URL, "new");
    let recorder = ChangeRecorder::new(
        Arc::clone(&registry),
        Arc::new(fetcher),
        Duration::from_secs(1),
    );
    let resource = registry.list_resources().unwrap().remove(0);

    fs.fail_writes(true);
    let outcome = recorder.check(&resource).await;
    assert!(matches!(
        outcome,
        CheckOutcome::StorageFailed(RegistryError::Storage(_))
    ));
    assert_eq!(registry.get_last_content(id).unwrap().as_deref(), Some("old"));
    assert!(registry.list_history(id).unwrap().is_empty());

    fs.fail_writes(false);
    assert_eq!(recorder.check(&resource).await, CheckOutcome::Changed);
}

#[tokio::test]
async fn overlapping_cycles_for_one_resource_compose_sequentially() {
    init_tracing();
    let p = Pipeline::new();
    let resource = p.track(URL);

    p.fetcher.set_page(URL, "A");
    p.recorder.check(&resource).await;

    // Both racing cycles see "B"; the first is slow so they overlap.
    p.fetcher.set_page(URL, "B");
    p.fetcher.set_delay(URL, Duration::from_millis(50));

    let first = {
        let recorder = Arc::clone(&p.recorder);
        let resource = resource.clone();
        tokio::spawn(async move { recorder.check(&resource).await })
    };
    let second = {
        let recorder = Arc::clone(&p.recorder);
        let resource = resource.clone();
        tokio::spawn(async move { recorder.check(&resource).await })
    };

    let mut outcomes = vec![first.await.unwrap(), second.await.unwrap()];
    outcomes.sort_by_key(|o| format!("{o:?}"));

    assert_eq!(outcomes, vec![CheckOutcome::Changed, CheckOutcome::Unchanged]);
    assert_eq!(p.history_len(resource.id), 1);
    assert_eq!(p.last_content(resource.id).as_deref(), Some("B"));

    let patch = p.registry.list_history(resource.id).unwrap()[0]
        .patch
        .clone()
        .unwrap();
    assert!(patch.contains("-A"));
    assert!(patch.contains("+B"));
}

#[tokio::test]
async fn slow_resource_does_not_block_another() {
    init_tracing();
    let p = Pipeline::new();
    let slow = p.track("https://slow.test");
    let fast = p.track("https://fast.test");

    p.fetcher.set_page("https://slow.test", "slow");
    p.fetcher.set_delay("https://slow.test", Duration::from_secs(2));
    p.fetcher.set_page("https://fast.test", "fast");

    let slow_cycle = {
        let recorder = Arc::clone(&p.recorder);
        tokio::spawn(async move { recorder.check(&slow).await })
    };

    // Fails the test if the fast resource waits for the slow one.
    let fast_outcome = with_timeout_of(Duration::from_millis(500), p.recorder.check(&fast)).await;
    assert_eq!(fast_outcome, CheckOutcome::Baseline);

    slow_cycle.abort();
}

#[tokio::test]
async fn history_lists_newest_first() {
    init_tracing();
    let p = Pipeline::new();
    let resource = p.track(URL);

    p.fetcher.set_page(URL, "v0");
    p.recorder.check(&resource).await;

    let mut stamps = Vec::new();
    for body in ["v1", "v2", "v3"] {
        p.clock.advance(ChronoDuration::days(1));
        stamps.push(start_time() + ChronoDuration::days(stamps.len() as i64 + 1));
        p.fetcher.set_page(URL, body);
        assert_eq!(p.recorder.check(&resource).await, CheckOutcome::Changed);
    }

    let listed: Vec<_> = p
        .registry
        .list_history(resource.id)
        .unwrap()
        .into_iter()
        .map(|r| r.timestamp)
        .collect();
    stamps.reverse();
    assert_eq!(listed, stamps);
}

#[tokio::test]
async fn clock_stepping_back_keeps_history_ordered() {
    init_tracing();
    let p = Pipeline::new();
    let resource = p.track(URL);

    p.fetcher.set_page(URL, "v0");
    p.recorder.check(&resource).await;

    p.fetcher.set_page(URL, "v1");
    assert_eq!(p.recorder.check(&resource).await, CheckOutcome::Changed);

    // e.g. an NTP correction between two cycles
    p.clock.advance(ChronoDuration::seconds(-5));
    p.fetcher.set_page(URL, "v2");
    assert_eq!(p.recorder.check(&resource).await, CheckOutcome::Changed);

    let history = p.registry.list_history(resource.id).unwrap();
    assert_eq!(history.len(), 2);
    assert!(history[0].timestamp >= history[1].timestamp);
    assert_eq!(history[0].timestamp, start_time());

    let newest = history[0].patch.as_deref().unwrap();
    assert!(newest.contains("-v1") && newest.contains("+v2"), "{newest}");
}

/// Memory registry whose commits block the calling thread, like a slow disk.
#[derive(Debug, Default)]
struct SlowDiskRegistry {
    inner: pagewatch::registry::MemoryRegistry,
}

impl Registry for SlowDiskRegistry {
    fn insert_resource(&self, locator: &str) -> RegistryResult<ResourceId> {
        self.inner.insert_resource(locator)
    }

    fn list_resources(&self) -> RegistryResult<Vec<ResourceSummary>> {
        self.inner.list_resources()
    }

    fn get_last_content(&self, id: ResourceId) -> RegistryResult<Option<String>> {
        self.inner.get_last_content(id)
    }

    fn set_last_content(&self, id: ResourceId, content: &str) -> RegistryResult<()> {
        self.inner.set_last_content(id, content)
    }

    fn append_history(
        &self,
        id: ResourceId,
        timestamp: DateTime<Utc>,
        patch: Option<&str>,
    ) -> RegistryResult<()> {
        self.inner.append_history(id, timestamp, patch)
    }

    fn list_history(&self, id: ResourceId) -> RegistryResult<Vec<ChangeRecord>> {
        self.inner.list_history(id)
    }

    fn record_check(
        &self,
        id: ResourceId,
        content: &str,
        change: Option<&NewChange>,
    ) -> RegistryResult<()> {
        std::thread::sleep(Duration::from_millis(400));
        self.inner.record_check(id, content, change)
    }
}

#[tokio::test]
async fn slow_storage_does_not_block_the_runtime() {
    init_tracing();
    let registry: Arc<dyn Registry> = Arc::new(SlowDiskRegistry::default());
    let id = registry.insert_resource(URL).unwrap();
    let resource = registry.list_resources().unwrap().remove(0);

    let fetcher = pagewatch::fetch::MockFetcher::new();
    fetcher.set_page(URL, "body");
    let recorder = Arc::new(ChangeRecorder::new(
        Arc::clone(&registry),
        Arc::new(fetcher),
        Duration::from_secs(1),
    ));

    let cycle = {
        let recorder = Arc::clone(&recorder);
        tokio::spawn(async move { recorder.check(&resource).await })
    };

    // Single-threaded runtime: this timer only fires on time if the commit
    // is not running on the runtime thread.
    let started = Instant::now();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(
        started.elapsed() < Duration::from_millis(300),
        "timer stalled for {:?}",
        started.elapsed()
    );

    assert_eq!(with_timeout(cycle).await.unwrap(), CheckOutcome::Baseline);
    assert_eq!(registry.get_last_content(id).unwrap().as_deref(), Some("body"));
}
