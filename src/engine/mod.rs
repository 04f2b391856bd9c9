// src/engine/mod.rs

//! Orchestration engine for pagewatch.
//!
//! This module ties together:
//! - the sweep state machine (Idle / Sweeping)
//! - the dispatcher that fans a sweep out into per-resource check cycles
//! - the main runtime event loop that reacts to:
//!   - cadence ticks and manual triggers
//!   - sweep completion reports
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`]; [`scheduler`] owns both as a process-level
//! component with explicit start/stop.

/// Monotonic identifier of a sweep within one process.
pub type SweepId = u64;

/// Why a sweep was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepReason {
    /// The configured cadence fired.
    Cadence,
    /// Explicit trigger (startup sweep, `--once`, tests).
    Manual,
}

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    /// If true, exit the runtime once no sweep is dispatching or in flight
    /// (used for `--once`).
    pub exit_when_idle: bool,
}

/// Events flowing into the runtime from the ticker, dispatcher, etc.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A sweep should start.
    SweepDue { reason: SweepReason },
    /// Every cycle of `sweep_id` has been handed to its own task.
    SweepDispatched { sweep_id: SweepId, dispatched: usize },
    /// Every cycle of `sweep_id` has finished.
    SweepCompleted { sweep_id: SweepId, report: SweepReport },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod dispatch;
pub mod report;
pub mod runtime;
pub mod scheduler;
pub mod sweep;

pub use core::{CoreCommand, CoreRuntime, CoreStep, SchedulerState};
pub use dispatch::{RecorderDispatcher, SweepDispatcher};
pub use report::SweepReport;
pub use runtime::Runtime;
pub use scheduler::Scheduler;
pub use sweep::{dispatch_cycles, run_sweep, CycleResult};
