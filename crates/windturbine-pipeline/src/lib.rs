//! # Windturbine Pipeline
//!
//! Watches for a turbine sensor file, consumes it, stores the reading and
//! notifies according to the temperature.
//!
//! Components are built from an explicit config snapshot and share one
//! [`RunContext`] per run. [`Pipeline`] wires them into the task graph and
//! implements [`windturbine_scheduler::Job`] so the scheduler can host it.

pub mod context;
pub mod dag;
pub mod extractor;
pub mod messages;
pub mod router;
pub mod watcher;

pub use context::{RunContext, RunState};
pub use dag::{Pipeline, RunOutcome};
pub use extractor::Extractor;
pub use router::ThresholdRouter;
pub use watcher::FileWatcher;
