// src/schedule/ticker.rs

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::Cadence;
use crate::engine::{RuntimeEvent, SweepReason};

/// Handle for the background ticker task.
///
/// Dropping the handle stops the ticker.
pub struct TickerHandle {
    inner: JoinHandle<()>,
}

impl TickerHandle {
    pub fn stop(&self) {
        self.inner.abort();
    }
}

impl Drop for TickerHandle {
    fn drop(&mut self) {
        self.inner.abort();
    }
}

impl std::fmt::Debug for TickerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickerHandle").finish()
    }
}

/// Spawn a task that sleeps until each fire time of `cadence` and then sends
/// `RuntimeEvent::SweepDue` into the runtime.
///
/// The ticker never waits for a sweep to finish; if a sweep runs past the
/// next fire time, the runtime sees overlapping sweeps.
pub fn spawn_ticker(cadence: Cadence, runtime_tx: mpsc::Sender<RuntimeEvent>) -> TickerHandle {
    let inner = tokio::spawn(async move {
        loop {
            let now = Utc::now();
            let Some(next) = cadence.next_after(now) else {
                warn!(cadence = ?cadence, "cron schedule has no future fire time; ticker stopping");
                return;
            };

            let wait = (next - now).to_std().unwrap_or_default();
            info!(next = %next.with_timezone(&cadence.timezone()), "next sweep scheduled");
            tokio::time::sleep(wait).await;

            debug!("cadence fired");
            let event = RuntimeEvent::SweepDue {
                reason: SweepReason::Cadence,
            };
            if runtime_tx.send(event).await.is_err() {
                debug!("runtime channel closed; ticker stopping");
                return;
            }
        }
    });

    TickerHandle { inner }
}
