//! Task definitions: per-run task records and the uniform retry policy.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

use windturbine_core::config::ScheduleConfig;
use windturbine_core::error::{Result, WindTurbineError};

/// State of one task within a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum TaskStatus {
    Pending,
    Success,
    /// Failed after exhausting its retries; carries the last error.
    Failed(String),
    /// Never started because a task it depends on failed.
    UpstreamFailed,
    /// Not selected by a branch decision.
    Skipped,
}

/// Outcome of one task within a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub name: String,
    pub status: TaskStatus,
    /// Number of times the task body ran (0 when it never started).
    pub attempts: u32,
}

impl TaskRecord {
    pub fn new(name: &str, status: TaskStatus, attempts: u32) -> Self {
        Self {
            name: name.to_string(),
            status,
            attempts,
        }
    }

    pub fn upstream_failed(name: &str) -> Self {
        Self::new(name, TaskStatus::UpstreamFailed, 0)
    }

    pub fn skipped(name: &str) -> Self {
        Self::new(name, TaskStatus::Skipped, 0)
    }
}

/// Summary of one completed run, kept in the scheduler's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    /// Schedule slot this run belongs to.
    pub logical_date: DateTime<Utc>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub tasks: Vec<TaskRecord>,
}

impl RunSummary {
    /// True when no task failed (skipped branches do not count as failures).
    pub fn is_success(&self) -> bool {
        self.tasks
            .iter()
            .all(|t| matches!(t.status, TaskStatus::Success | TaskStatus::Skipped))
    }

    pub fn task(&self, name: &str) -> Option<&TaskRecord> {
        self.tasks.iter().find(|t| t.name == name)
    }

    pub fn failed_tasks(&self) -> impl Iterator<Item = &TaskRecord> {
        self.tasks
            .iter()
            .filter(|t| matches!(t.status, TaskStatus::Failed(_)))
    }
}

/// Identifies a task attempt in logs and notifications.
#[derive(Debug, Clone, Copy)]
pub struct TaskRef<'a> {
    pub run_id: &'a str,
    pub task: &'a str,
}

/// Hook invoked before each retry.
#[async_trait]
pub trait RetryObserver: Send + Sync {
    async fn on_retry(&self, task: TaskRef<'_>, attempt: u32, error: &WindTurbineError);
}

/// Observer that does nothing.
pub struct NoopObserver;

#[async_trait]
impl RetryObserver for NoopObserver {
    async fn on_retry(&self, _task: TaskRef<'_>, _attempt: u32, _error: &WindTurbineError) {}
}

/// Result of running a task under a [`RetryPolicy`].
#[derive(Debug)]
pub struct Attempted<T> {
    pub result: Result<T>,
    pub attempts: u32,
}

/// Fixed retry count with a fixed delay, the same for every task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(retries: u32, delay: Duration) -> Self {
        Self { retries, delay }
    }

    pub fn from_config(config: &ScheduleConfig) -> Self {
        Self::new(config.retries, Duration::from_secs(config.retry_delay_secs))
    }

    pub fn max_attempts(&self) -> u32 {
        self.retries + 1
    }

    /// Run `op` until it succeeds or `retries + 1` attempts have failed.
    pub async fn run<T, F, Fut>(
        &self,
        task: TaskRef<'_>,
        observer: &dyn RetryObserver,
        mut op: F,
    ) -> Attempted<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!(run_id = task.run_id, "✅ '{}' succeeded on attempt {attempt}", task.task);
                    }
                    return Attempted {
                        result: Ok(value),
                        attempts: attempt,
                    };
                }
                Err(e) if attempt <= self.retries => {
                    tracing::warn!(
                        run_id = task.run_id,
                        "⚠️ '{}' attempt {attempt}/{} failed: {e} (retrying in {}s)",
                        task.task,
                        self.max_attempts(),
                        self.delay.as_secs()
                    );
                    observer.on_retry(task, attempt, &e).await;
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(
                        run_id = task.run_id,
                        "❌ '{}' failed after {attempt} attempt(s): {e}",
                        task.task
                    );
                    return Attempted {
                        result: Err(e),
                        attempts: attempt,
                    };
                }
            }
        }
    }
}
