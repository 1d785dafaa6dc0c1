//! Scheduler Engine: the main loop that checks the cadence and triggers runs.
//! Uses tokio::interval for ticking (sleeps between checks).
//!
//! Missed slots are not replayed unless `catchup` is set, and a slot that
//! arrives while `max_active_runs` runs are still going is skipped.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

use windturbine_core::config::ScheduleConfig;
use windturbine_core::error::Result;

use crate::cron::CronSchedule;
use crate::tasks::RunSummary;

/// Completed runs kept in memory.
const HISTORY_LIMIT: usize = 100;

/// Work executed once per due schedule slot.
#[async_trait]
pub trait Job: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, logical_date: DateTime<Utc>) -> RunSummary;
}

/// Counters exposed for status output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub started: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub skipped_busy: u64,
    pub missed_slots: u64,
}

/// The scheduler engine: owns the cadence and the run history.
pub struct SchedulerEngine {
    schedule: CronSchedule,
    catchup: bool,
    max_active_runs: u32,
    active_runs: u32,
    next_run: Option<DateTime<Utc>>,
    stats: SchedulerStats,
    history: VecDeque<RunSummary>,
}

impl SchedulerEngine {
    /// Create an engine whose first slot is the first cron match after `now`.
    pub fn new(config: &ScheduleConfig, now: DateTime<Utc>) -> Result<Self> {
        let schedule = CronSchedule::parse(&config.cron)?;
        let next_run = schedule.next_after(now);
        Ok(Self {
            schedule,
            catchup: config.catchup,
            max_active_runs: config.max_active_runs.max(1),
            active_runs: 0,
            next_run,
            stats: SchedulerStats::default(),
            history: VecDeque::new(),
        })
    }

    /// Check whether a run is due at `now`.
    ///
    /// Returns the logical date of the run to start, and counts it as active.
    /// The caller must report back through [`SchedulerEngine::finish`].
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let slot = self.next_run.filter(|next| now >= *next)?;

        if self.active_runs >= self.max_active_runs {
            self.stats.skipped_busy += 1;
            if !self.catchup {
                // Drop the slot rather than queueing it behind the active run.
                self.next_run = self.schedule.next_after(now);
            }
            tracing::info!("⏭️ Slot {} skipped: {} run(s) still active", slot.to_rfc3339(), self.active_runs);
            return None;
        }

        let slot = if self.catchup {
            self.next_run = self.schedule.next_after(slot);
            slot
        } else {
            let (latest, missed) = self.latest_due(slot, now);
            if missed > 0 {
                self.stats.missed_slots += missed;
                tracing::info!("⏩ {missed} missed slot(s) not replayed (catchup disabled)");
            }
            self.next_run = self.schedule.next_after(now);
            latest
        };

        self.active_runs += 1;
        self.stats.started += 1;
        tracing::info!("🔔 Run triggered for slot {}", slot.to_rfc3339());
        Some(slot)
    }

    /// Record a finished run.
    pub fn finish(&mut self, summary: RunSummary) {
        self.active_runs = self.active_runs.saturating_sub(1);
        if summary.is_success() {
            self.stats.succeeded += 1;
        } else {
            self.stats.failed += 1;
        }
        self.history.push_back(summary);
        if self.history.len() > HISTORY_LIMIT {
            self.history.pop_front();
        }
    }

    /// Most recent slot at or before `now`, and how many older due slots it
    /// supersedes.
    fn latest_due(&self, slot: DateTime<Utc>, now: DateTime<Utc>) -> (DateTime<Utc>, u64) {
        let mut missed = 0;
        let mut latest = slot;
        while let Some(next) = self.schedule.next_after(latest) {
            if next > now {
                break;
            }
            missed += 1;
            latest = next;
        }
        (latest, missed)
    }

    pub fn next_run(&self) -> Option<DateTime<Utc>> {
        self.next_run
    }

    pub fn active_runs(&self) -> u32 {
        self.active_runs
    }

    pub fn stats(&self) -> &SchedulerStats {
        &self.stats
    }

    pub fn history(&self) -> impl Iterator<Item = &RunSummary> {
        self.history.iter()
    }

    pub fn cron(&self) -> &str {
        self.schedule.expression()
    }
}

/// Spawn the scheduler loop. Each due slot runs the job on its own tokio task
/// so a long run never blocks the cadence check.
pub async fn spawn_scheduler(
    engine: Arc<Mutex<SchedulerEngine>>,
    job: Arc<dyn Job>,
    check_interval_secs: u64,
) {
    tracing::info!(
        "⏰ Scheduler started for '{}' (check every {}s)",
        job.name(),
        check_interval_secs
    );

    let mut interval =
        tokio::time::interval(std::time::Duration::from_secs(check_interval_secs.max(1)));

    loop {
        interval.tick().await;

        let due = {
            let mut eng = engine.lock().await;
            eng.tick(Utc::now())
        };

        let Some(logical_date) = due else {
            continue;
        };

        let engine = engine.clone();
        let job = job.clone();
        tokio::spawn(async move {
            let summary = job.run(logical_date).await;
            let ok = summary.is_success();
            tracing::info!(
                run_id = %summary.run_id,
                "{} Run finished: {}",
                if ok { "✅" } else { "❌" },
                if ok { "success" } else { "failed" }
            );
            engine.lock().await.finish(summary);
        });
    }
}
