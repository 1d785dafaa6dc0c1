//! # Windturbine Scheduler
//!
//! The thin runtime that hosts the pipeline: a cron cadence, a uniform
//! fixed-delay retry policy, and operator notices when a task gives up.
//!
//! ## Architecture
//! ```text
//! Scheduler (tokio interval)
//!   ├── CronSchedule: "* * * * *" → next slot
//!   ├── tick(now) → due? busy? missed slots?
//!   └── on due → Job::run(logical_date) on its own task
//!                  └── each task → RetryPolicy (retries × fixed delay)
//!                                   └── on give-up → OperatorAlerts → Notifier
//! ```

pub mod cron;
pub mod dispatch;
pub mod engine;
pub mod notify;
pub mod tasks;

pub use cron::CronSchedule;
pub use dispatch::OperatorAlerts;
pub use engine::{Job, SchedulerEngine, SchedulerStats, spawn_scheduler};
pub use notify::{Notification, NotifyLog, NotifyPriority};
pub use tasks::{Attempted, NoopObserver, RetryObserver, RetryPolicy, RunSummary, TaskRecord, TaskRef, TaskStatus};
