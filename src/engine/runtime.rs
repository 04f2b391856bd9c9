// src/engine/runtime.rs

use std::collections::VecDeque;
use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::engine::dispatch::SweepDispatcher;
use crate::errors::Result;

use super::core::CoreRuntime;
use super::{CoreCommand, RuntimeEvent, SweepReport};

/// Drives the sweep state machine in response to `RuntimeEvent`s, and
/// delegates the actual fan-out to a `SweepDispatcher`.
///
/// This is a pure IO shell around `CoreRuntime`, which contains all the
/// runtime semantics.
pub struct Runtime<D: SweepDispatcher> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    dispatcher: D,
}

impl<D: SweepDispatcher> fmt::Debug for Runtime<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<D: SweepDispatcher> Runtime<D> {
    pub fn new(core: CoreRuntime, event_rx: mpsc::Receiver<RuntimeEvent>, dispatcher: D) -> Self {
        Self {
            core,
            event_rx,
            dispatcher,
        }
    }

    /// Main event loop.
    ///
    /// - Consumes `RuntimeEvent`s from `event_rx`.
    /// - Feeds them into the core runtime.
    /// - Executes commands returned by the core (start sweeps, exit).
    ///
    /// Returns the reports of every sweep that completed while running.
    pub async fn run(mut self) -> Result<Vec<SweepReport>> {
        info!("pagewatch runtime started");

        loop {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("runtime event channel closed; exiting");
                    break;
                }
            };

            debug!(?event, "runtime received event");

            let step = self.core.step(event);
            let mut keep_running = step.keep_running;
            let mut pending: VecDeque<CoreCommand> = step.commands.into();

            while let Some(command) = pending.pop_front() {
                match command {
                    CoreCommand::StartSweep { sweep_id, .. } => {
                        let dispatched = self.dispatcher.dispatch_sweep(sweep_id).await?;
                        let follow_up = self.core.step(RuntimeEvent::SweepDispatched {
                            sweep_id,
                            dispatched,
                        });
                        keep_running &= follow_up.keep_running;
                        pending.extend(follow_up.commands);
                    }
                    CoreCommand::RequestExit => {
                        info!("core issued RequestExit command");
                    }
                }
            }

            if !keep_running {
                info!("core requested exit; stopping runtime");
                break;
            }
        }

        info!("runtime exiting");
        Ok(self.core.into_completed())
    }
}
