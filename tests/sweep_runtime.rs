// tests/sweep_runtime.rs

use std::error::Error;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pagewatch::engine::{
    dispatch_cycles, run_sweep, CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions, Scheduler,
    SweepReason,
};
use pagewatch::errors::FetchError;
use pagewatch::recorder::CheckOutcome;
use pagewatch::registry::Registry;
use pagewatch_test_utils::fake_dispatcher::FakeDispatcher;
use pagewatch_test_utils::harness::Pipeline;
use pagewatch_test_utils::{init_tracing, with_timeout};
use tokio::sync::mpsc;
use tokio::time::timeout;

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn runtime_with_fake_dispatcher_exits_when_idle() -> TestResult {
    init_tracing();

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(16);
    let dispatched = Arc::new(Mutex::new(Vec::new()));
    let dispatcher = FakeDispatcher::new(rt_tx.clone(), dispatched.clone(), 3);

    rt_tx
        .send(RuntimeEvent::SweepDue {
            reason: SweepReason::Manual,
        })
        .await?;

    let core = CoreRuntime::new(RuntimeOptions {
        exit_when_idle: true,
    });
    let runtime = Runtime::new(core, rt_rx, dispatcher);

    let reports = timeout(Duration::from_secs(3), runtime.run()).await??;

    assert_eq!(*dispatched.lock().unwrap(), vec![1]);
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].sweep_id, 1);
    assert_eq!(reports[0].dispatched, 3);
    Ok(())
}

#[tokio::test]
async fn scheduler_handle_can_be_triggered_and_shut_down() -> TestResult {
    init_tracing();

    let dispatched = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&dispatched);
    let scheduler = Scheduler::start_with(
        move |tx| FakeDispatcher::new(tx, seen, 1),
        None,
        RuntimeOptions::default(),
    );

    scheduler.trigger_now().await?;
    scheduler.trigger_now().await?;

    // Wait until both sweeps were dispatched before asking for shutdown.
    with_timeout(async {
        while dispatched.lock().unwrap().len() < 2 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;

    let _reports = with_timeout(scheduler.shutdown()).await?;
    assert_eq!(*dispatched.lock().unwrap(), vec![1, 2]);
    Ok(())
}

#[tokio::test]
async fn one_failing_resource_does_not_affect_the_others() {
    init_tracing();
    let p = Pipeline::new();
    let ok_a = p.track("https://a.test");
    let broken = p.track("https://broken.test");
    let ok_c = p.track("https://c.test");

    p.fetcher.set_page("https://a.test", "a");
    p.fetcher.set_page("https://c.test", "c");
    p.fetcher.set_failure(
        "https://broken.test",
        FetchError::Status {
            locator: "https://broken.test".to_string(),
            status: 500,
        },
    );

    let report = with_timeout(run_sweep(&p.recorder, 1)).await;

    assert_eq!(report.dispatched, 3);
    assert_eq!(report.baseline, 2);
    assert_eq!(report.fetch_failed, 1);
    assert_eq!(report.finished(), 3);

    assert_eq!(p.last_content(ok_a.id).as_deref(), Some("a"));
    assert_eq!(p.last_content(ok_c.id).as_deref(), Some("c"));
    assert_eq!(p.last_content(broken.id), None);
}

#[tokio::test]
async fn resources_added_after_snapshot_wait_for_next_sweep() {
    init_tracing();
    let p = Pipeline::new();
    p.track("https://early.test");
    p.fetcher.set_page("https://early.test", "early");
    p.fetcher.set_page("https://late.test", "late");

    let snapshot = p.registry.list_resources().unwrap();
    let late = p.track("https://late.test");

    let cycles = dispatch_cycles(&p.recorder, snapshot);
    let results = with_timeout(cycles.join_all()).await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].resource.locator, "https://early.test");
    assert_eq!(p.fetcher.calls("https://late.test"), 0);
    assert_eq!(p.last_content(late.id), None);

    // Next sweep picks it up.
    let report = with_timeout(run_sweep(&p.recorder, 2)).await;
    assert_eq!(report.dispatched, 2);
    assert_eq!(p.last_content(late.id).as_deref(), Some("late"));
}

#[tokio::test]
async fn overlapping_sweeps_record_each_change_once() {
    init_tracing();
    let p = Pipeline::new();
    let resource = p.track("https://x.test");

    p.fetcher.set_page("https://x.test", "v1");
    with_timeout(run_sweep(&p.recorder, 1)).await;

    p.fetcher.set_page("https://x.test", "v2");
    p.fetcher.set_delay("https://x.test", Duration::from_millis(40));

    let (a, b) = with_timeout(async {
        tokio::join!(run_sweep(&p.recorder, 2), run_sweep(&p.recorder, 3))
    })
    .await;

    assert_eq!(a.changed + b.changed, 1);
    assert_eq!(a.unchanged + b.unchanged, 1);
    assert_eq!(p.history_len(resource.id), 1);
}

#[tokio::test]
async fn scheduler_runs_real_cycles_end_to_end() -> TestResult {
    init_tracing();
    let p = Pipeline::new();
    let resource = p.track("https://x.test");
    p.fetcher.set_page("https://x.test", "first");

    let scheduler = Scheduler::start(
        Arc::clone(&p.recorder),
        None,
        RuntimeOptions {
            exit_when_idle: true,
        },
    );
    scheduler.trigger_now().await?;
    let reports = with_timeout(scheduler.wait()).await?;

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].baseline, 1);
    assert_eq!(p.last_content(resource.id).as_deref(), Some("first"));

    p.fetcher.set_page("https://x.test", "second");
    let scheduler = Scheduler::start(
        Arc::clone(&p.recorder),
        None,
        RuntimeOptions {
            exit_when_idle: true,
        },
    );
    scheduler.trigger_now().await?;
    let reports = with_timeout(scheduler.wait()).await?;

    assert_eq!(reports[0].changed, 1);
    assert_eq!(p.history_len(resource.id), 1);
    assert!(matches!(
        p.recorder.check(&resource).await,
        CheckOutcome::Unchanged
    ));
    Ok(())
}

#[tokio::test]
async fn empty_registry_sweep_completes() -> TestResult {
    init_tracing();
    let p = Pipeline::new();

    let scheduler = Scheduler::start(
        Arc::clone(&p.recorder),
        None,
        RuntimeOptions {
            exit_when_idle: true,
        },
    );
    scheduler.trigger_now().await?;
    let reports = with_timeout(scheduler.wait()).await?;

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].dispatched, 0);
    assert!(!reports[0].listing_failed);
    Ok(())
}
