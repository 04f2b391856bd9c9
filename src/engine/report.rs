// src/engine/report.rs

use tokio::task::JoinSet;
use tracing::error;

use crate::engine::sweep::CycleResult;
use crate::engine::SweepId;
use crate::recorder::CheckOutcome;

/// Per-sweep tally of check outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub sweep_id: SweepId,
    pub dispatched: usize,
    pub baseline: usize,
    pub unchanged: usize,
    pub changed: usize,
    pub fetch_failed: usize,
    pub storage_failed: usize,
    /// Cycles whose task panicked or was cancelled.
    pub aborted: usize,
    /// The resource list itself could not be read; nothing was dispatched.
    pub listing_failed: bool,
}

impl SweepReport {
    pub fn new(sweep_id: SweepId) -> Self {
        Self {
            sweep_id,
            ..Self::default()
        }
    }

    pub fn record(&mut self, outcome: &CheckOutcome) {
        match outcome {
            CheckOutcome::Baseline => self.baseline += 1,
            CheckOutcome::Unchanged => self.unchanged += 1,
            CheckOutcome::Changed => self.changed += 1,
            CheckOutcome::FetchFailed(_) => self.fetch_failed += 1,
            CheckOutcome::StorageFailed(_) => self.storage_failed += 1,
        }
    }

    /// Cycles that finished, whatever their outcome.
    pub fn finished(&self) -> usize {
        self.baseline + self.unchanged + self.changed + self.fetch_failed + self.storage_failed
    }

    /// Wait for every cycle in `cycles` and tally the outcomes.
    pub async fn collect(sweep_id: SweepId, mut cycles: JoinSet<CycleResult>) -> Self {
        let mut report = Self::new(sweep_id);
        report.dispatched = cycles.len();

        while let Some(joined) = cycles.join_next().await {
            match joined {
                Ok(result) => report.record(&result.outcome),
                Err(err) => {
                    error!(sweep_id, error = %err, "check cycle task aborted");
                    report.aborted += 1;
                }
            }
        }
        report
    }
}
