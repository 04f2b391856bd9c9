// src/engine/dispatch.rs

//! Pluggable sweep dispatcher abstraction.
//!
//! The runtime talks to a `SweepDispatcher` instead of calling the recorder
//! directly. This makes it easy to swap in a fake dispatcher in tests while
//! keeping the production fan-out in [`RecorderDispatcher`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::engine::sweep::dispatch_cycles;
use crate::engine::{RuntimeEvent, SweepId, SweepReport};
use crate::errors::Result;
use crate::recorder::ChangeRecorder;

/// Trait abstracting how a sweep is fanned out.
///
/// Implementations must return once every cycle has been *dispatched*, and
/// must eventually deliver exactly one `RuntimeEvent::SweepCompleted` for
/// `sweep_id` on their own (never by blocking the caller).
pub trait SweepDispatcher: Send {
    /// Dispatch every cycle of `sweep_id`; returns how many were dispatched.
    fn dispatch_sweep(
        &mut self,
        sweep_id: SweepId,
    ) -> Pin<Box<dyn Future<Output = Result<usize>> + Send + '_>>;
}

/// Production dispatcher: one `ChangeRecorder::check` task per resource.
pub struct RecorderDispatcher {
    recorder: Arc<ChangeRecorder>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
}

impl RecorderDispatcher {
    pub fn new(recorder: Arc<ChangeRecorder>, runtime_tx: mpsc::Sender<RuntimeEvent>) -> Self {
        Self {
            recorder,
            runtime_tx,
        }
    }
}

impl SweepDispatcher for RecorderDispatcher {
    fn dispatch_sweep(
        &mut self,
        sweep_id: SweepId,
    ) -> Pin<Box<dyn Future<Output = Result<usize>> + Send + '_>> {
        let recorder = Arc::clone(&self.recorder);
        let tx = self.runtime_tx.clone();

        Box::pin(async move {
            // Point-in-time snapshot of the registry.
            let resources = match recorder.registry().list_resources() {
                Ok(resources) => resources,
                Err(err) => {
                    error!(sweep_id, error = %err, "could not list tracked resources; skipping sweep");
                    let mut report = SweepReport::new(sweep_id);
                    report.listing_failed = true;
                    tokio::spawn(async move {
                        let _ = tx.send(RuntimeEvent::SweepCompleted { sweep_id, report }).await;
                    });
                    return Ok(0);
                }
            };

            let cycles = dispatch_cycles(&recorder, resources);
            let dispatched = cycles.len();

            // Completion is reported from a separate task so the runtime
            // loop never waits on a fetch.
            tokio::spawn(async move {
                let report = SweepReport::collect(sweep_id, cycles).await;
                if tx
                    .send(RuntimeEvent::SweepCompleted { sweep_id, report })
                    .await
                    .is_err()
                {
                    debug!(sweep_id, "runtime gone before sweep completed");
                }
            });

            Ok(dispatched)
        })
    }
}
