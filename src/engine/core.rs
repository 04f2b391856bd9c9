// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from channels
//! - handing sweeps to the dispatcher
//! - handling Ctrl+C / shutdown
//!
//! State machine:
//! - `Idle --SweepDue--> Sweeping`
//! - `Sweeping --SweepDispatched--> Idle`
//!
//! Sweeping ends once every cycle is *dispatched*, not completed. Completed
//! sweeps are tracked separately so that overlapping sweeps are visible.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::engine::{RuntimeEvent, RuntimeOptions, SweepId, SweepReason, SweepReport};

/// Externally visible scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Sweeping { sweep_id: SweepId },
}

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Snapshot the registry and dispatch one check cycle per resource.
    StartSweep { sweep_id: SweepId, reason: SweepReason },
    /// Request that the process exits (used for `--once` when idle).
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn continue_with(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }
}

/// Pure core runtime state.
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime {
    state: SchedulerState,
    next_sweep_id: SweepId,
    /// Sweeps dispatched but not yet completed.
    in_flight: BTreeSet<SweepId>,
    /// Trigger that arrived while a sweep was being dispatched.
    pending: Option<SweepReason>,
    completed: Vec<SweepReport>,
    options: RuntimeOptions,
}

impl CoreRuntime {
    pub fn new(options: RuntimeOptions) -> Self {
        Self {
            state: SchedulerState::Idle,
            next_sweep_id: 1,
            in_flight: BTreeSet::new(),
            pending: None,
            completed: Vec::new(),
            options,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == SchedulerState::Idle
    }

    /// Sweeps whose cycles are still running.
    pub fn in_flight(&self) -> impl Iterator<Item = SweepId> + '_ {
        self.in_flight.iter().copied()
    }

    /// Reports of every completed sweep, in completion order.
    pub fn completed(&self) -> &[SweepReport] {
        &self.completed
    }

    pub fn into_completed(self) -> Vec<SweepReport> {
        self.completed
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::SweepDue { reason } => self.handle_sweep_due(reason),
            RuntimeEvent::SweepDispatched {
                sweep_id,
                dispatched,
            } => self.handle_sweep_dispatched(sweep_id, dispatched),
            RuntimeEvent::SweepCompleted { sweep_id, report } => {
                self.handle_sweep_completed(sweep_id, report)
            }
            RuntimeEvent::ShutdownRequested => CoreStep {
                commands: Vec::new(),
                keep_running: false,
            },
        }
    }

    fn handle_sweep_due(&mut self, reason: SweepReason) -> CoreStep {
        if let SchedulerState::Sweeping { sweep_id } = self.state {
            debug!(sweep_id, ?reason, "trigger while dispatching; deferring");
            self.pending = Some(reason);
            return CoreStep::continue_with(Vec::new());
        }

        CoreStep::continue_with(vec![self.start_sweep(reason)])
    }

    fn start_sweep(&mut self, reason: SweepReason) -> CoreCommand {
        let sweep_id = self.next_sweep_id;
        self.next_sweep_id += 1;
        self.state = SchedulerState::Sweeping { sweep_id };

        if !self.in_flight.is_empty() {
            let running: Vec<SweepId> = self.in_flight.iter().copied().collect();
            warn!(
                sweep_id,
                ?running,
                "starting sweep while earlier sweeps are still running; cycles may overlap"
            );
        }

        info!(sweep_id, ?reason, "sweep started");
        CoreCommand::StartSweep { sweep_id, reason }
    }

    fn handle_sweep_dispatched(&mut self, sweep_id: SweepId, dispatched: usize) -> CoreStep {
        if self.state != (SchedulerState::Sweeping { sweep_id }) {
            warn!(sweep_id, state = ?self.state, "dispatch notice for a sweep that is not active; ignoring");
            return CoreStep::continue_with(Vec::new());
        }

        info!(sweep_id, dispatched, "sweep dispatched");
        self.state = SchedulerState::Idle;
        self.in_flight.insert(sweep_id);

        let mut commands = Vec::new();
        if let Some(reason) = self.pending.take() {
            commands.push(self.start_sweep(reason));
        }
        CoreStep::continue_with(commands)
    }

    fn handle_sweep_completed(&mut self, sweep_id: SweepId, report: SweepReport) -> CoreStep {
        if !self.in_flight.remove(&sweep_id) {
            warn!(sweep_id, "completion for unknown sweep");
        }

        info!(
            sweep_id,
            dispatched = report.dispatched,
            baseline = report.baseline,
            unchanged = report.unchanged,
            changed = report.changed,
            fetch_failed = report.fetch_failed,
            storage_failed = report.storage_failed,
            "sweep completed"
        );
        self.completed.push(report);

        if self.options.exit_when_idle && self.is_quiescent() {
            return CoreStep {
                commands: vec![CoreCommand::RequestExit],
                keep_running: false,
            };
        }
        CoreStep::continue_with(Vec::new())
    }

    fn is_quiescent(&self) -> bool {
        self.is_idle() && self.in_flight.is_empty() && self.pending.is_none()
    }
}
