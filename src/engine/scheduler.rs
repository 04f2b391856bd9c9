// src/engine/scheduler.rs

//! Process-owned scheduler component.
//!
//! Owns the runtime task and (optionally) the cadence ticker. Nothing here is
//! global: tests start a scheduler without a cadence and fire sweeps by hand.

use std::sync::Arc;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::engine::{
    CoreRuntime, RecorderDispatcher, Runtime, RuntimeEvent, RuntimeOptions, SweepDispatcher,
    SweepReason, SweepReport,
};
use crate::errors::{PagewatchError, Result};
use crate::recorder::ChangeRecorder;
use crate::schedule::{spawn_ticker, Cadence, TickerHandle};

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug)]
pub struct Scheduler {
    tx: mpsc::Sender<RuntimeEvent>,
    runtime: JoinHandle<Result<Vec<SweepReport>>>,
    ticker: Option<TickerHandle>,
}

impl Scheduler {
    /// Start the production scheduler: sweeps run `recorder` over every
    /// tracked resource. Without a cadence, sweeps only run when triggered.
    pub fn start(
        recorder: Arc<ChangeRecorder>,
        cadence: Option<Cadence>,
        options: RuntimeOptions,
    ) -> Self {
        Self::start_with(
            move |tx| RecorderDispatcher::new(recorder, tx),
            cadence,
            options,
        )
    }

    /// Start with a custom dispatcher, built from the runtime's event sender.
    pub fn start_with<D, F>(make_dispatcher: F, cadence: Option<Cadence>, options: RuntimeOptions) -> Self
    where
        D: SweepDispatcher + 'static,
        F: FnOnce(mpsc::Sender<RuntimeEvent>) -> D,
    {
        let (tx, rx) = mpsc::channel::<RuntimeEvent>(EVENT_CHANNEL_CAPACITY);
        let dispatcher = make_dispatcher(tx.clone());
        let runtime = Runtime::new(CoreRuntime::new(options), rx, dispatcher);
        let runtime = tokio::spawn(runtime.run());
        let ticker = cadence.map(|c| spawn_ticker(c, tx.clone()));

        Self {
            tx,
            runtime,
            ticker,
        }
    }

    /// Sender into the runtime, e.g. for a Ctrl-C handler.
    pub fn sender(&self) -> mpsc::Sender<RuntimeEvent> {
        self.tx.clone()
    }

    /// Start a sweep now, independent of the cadence.
    pub async fn trigger_now(&self) -> Result<()> {
        self.tx
            .send(RuntimeEvent::SweepDue {
                reason: SweepReason::Manual,
            })
            .await
            .map_err(|_| PagewatchError::Other(anyhow!("scheduler runtime has stopped")))
    }

    /// Stop the ticker, ask the runtime to exit, and wait for it.
    ///
    /// Cycles that are already running keep going in their own tasks.
    pub async fn shutdown(mut self) -> Result<Vec<SweepReport>> {
        self.stop_ticker();
        if self.tx.send(RuntimeEvent::ShutdownRequested).await.is_err() {
            debug!("runtime already stopped");
        }
        self.join().await
    }

    /// Wait for the runtime to stop on its own (`exit_when_idle` or shutdown
    /// via [`Scheduler::sender`]).
    pub async fn wait(mut self) -> Result<Vec<SweepReport>> {
        let reports = (&mut self.runtime)
            .await
            .map_err(|e| PagewatchError::Other(anyhow!("scheduler runtime task failed: {e}")))?;
        self.stop_ticker();
        reports
    }

    fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.stop();
        }
    }

    async fn join(self) -> Result<Vec<SweepReport>> {
        self.runtime
            .await
            .map_err(|e| PagewatchError::Other(anyhow!("scheduler runtime task failed: {e}")))?
    }
}
