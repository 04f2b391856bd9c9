// src/schedule/mod.rs

//! Wall-clock cadence of sweeps.
//!
//! - [`cadence`] parses a cron expression + time zone and computes fire times.
//! - [`ticker`] turns a cadence into `RuntimeEvent::SweepDue` events.

pub mod cadence;
pub mod ticker;

pub use cadence::Cadence;
pub use ticker::{spawn_ticker, TickerHandle};
