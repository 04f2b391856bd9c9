// src/engine/sweep.rs

//! Fan-out of one sweep into independent per-resource check cycles.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, error};

use crate::engine::{SweepId, SweepReport};
use crate::recorder::{ChangeRecorder, CheckOutcome};
use crate::types::ResourceSummary;

/// Outcome of one cycle, tagged with the resource it ran for.
#[derive(Debug, Clone)]
pub struct CycleResult {
    pub resource: ResourceSummary,
    pub outcome: CheckOutcome,
}

/// Spawn one check cycle per resource. Returns as soon as every cycle is
/// spawned; nothing here waits on a fetch.
pub fn dispatch_cycles(
    recorder: &Arc<ChangeRecorder>,
    resources: Vec<ResourceSummary>,
) -> JoinSet<CycleResult> {
    let mut cycles = JoinSet::new();
    for resource in resources {
        let recorder = Arc::clone(recorder);
        debug!(resource_id = %resource.id, locator = %resource.locator, "dispatching check");
        cycles.spawn(async move {
            let outcome = recorder.check(&resource).await;
            CycleResult { resource, outcome }
        });
    }
    cycles
}

/// Snapshot the registry, dispatch every cycle, and wait for all of them.
///
/// Resources registered after the snapshot is taken are left for the next
/// sweep.
pub async fn run_sweep(recorder: &Arc<ChangeRecorder>, sweep_id: SweepId) -> SweepReport {
    let resources = match recorder.registry().list_resources() {
        Ok(resources) => resources,
        Err(err) => {
            error!(sweep_id, error = %err, "could not list tracked resources; skipping sweep");
            let mut report = SweepReport::new(sweep_id);
            report.listing_failed = true;
            return report;
        }
    };

    let cycles = dispatch_cycles(recorder, resources);
    SweepReport::collect(sweep_id, cycles).await
}
