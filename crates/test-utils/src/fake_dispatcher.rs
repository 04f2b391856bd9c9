use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use pagewatch::engine::{RuntimeEvent, SweepDispatcher, SweepId, SweepReport};
use pagewatch::errors::Result;

/// A fake dispatcher that:
/// - records which sweeps were dispatched
/// - pretends every sweep checked `resources` pages
/// - immediately reports `SweepCompleted` for each sweep.
pub struct FakeDispatcher {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    dispatched: Arc<Mutex<Vec<SweepId>>>,
    resources: usize,
}

impl FakeDispatcher {
    pub fn new(
        runtime_tx: mpsc::Sender<RuntimeEvent>,
        dispatched: Arc<Mutex<Vec<SweepId>>>,
        resources: usize,
    ) -> Self {
        Self {
            runtime_tx,
            dispatched,
            resources,
        }
    }
}

impl SweepDispatcher for FakeDispatcher {
    fn dispatch_sweep(
        &mut self,
        sweep_id: SweepId,
    ) -> Pin<Box<dyn Future<Output = Result<usize>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let dispatched = Arc::clone(&self.dispatched);
        let resources = self.resources;

        Box::pin(async move {
            dispatched.lock().unwrap().push(sweep_id);

            let mut report = SweepReport::new(sweep_id);
            report.dispatched = resources;
            report.unchanged = resources;

            tokio::spawn(async move {
                let _ = tx.send(RuntimeEvent::SweepCompleted { sweep_id, report }).await;
            });
            Ok(resources)
        })
    }
}
