//! The pipeline graph.
//!
//! ```text
//! wait_for_file → extract ─┬─ create_table → insert_reading
//!                          └─ route_temperature ─┬─ notify_alert
//!                                                └─ notify_normal
//! ```
//!
//! Every task runs under the same [`RetryPolicy`]. When a task gives up the
//! operator is told and the tasks that depend on it are marked
//! `UpstreamFailed`. The two branches after `extract` run concurrently and
//! fail independently.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;

use windturbine_core::config::{PipelineConfig, WindTurbineConfig};
use windturbine_core::error::Result;
use windturbine_core::traits::{Notifier, SensorStore};
use windturbine_core::types::Branch;
use windturbine_scheduler::{
    Attempted, Job, OperatorAlerts, RetryPolicy, RunSummary, TaskRecord, TaskRef, TaskStatus,
};

use crate::context::{RunContext, RunState};
use crate::extractor::Extractor;
use crate::messages::message_for;
use crate::router::ThresholdRouter;
use crate::watcher::FileWatcher;

pub const TASK_WAIT_FOR_FILE: &str = "wait_for_file";
pub const TASK_EXTRACT: &str = "extract";
pub const TASK_CREATE_TABLE: &str = "create_table";
pub const TASK_INSERT_READING: &str = "insert_reading";
pub const TASK_ROUTE_TEMPERATURE: &str = "route_temperature";
pub const TASK_NOTIFY_ALERT: &str = "notify_alert";
pub const TASK_NOTIFY_NORMAL: &str = "notify_normal";

/// Tasks downstream of `extract`, in report order.
const DOWNSTREAM: [&str; 5] = [
    TASK_CREATE_TABLE,
    TASK_INSERT_READING,
    TASK_ROUTE_TEMPERATURE,
    TASK_NOTIFY_ALERT,
    TASK_NOTIFY_NORMAL,
];

/// What a run leaves behind: the task report and the context it ran in.
#[derive(Debug)]
pub struct RunOutcome {
    pub summary: RunSummary,
    pub context: RunContext,
}

pub struct Pipeline {
    config: PipelineConfig,
    recipient: String,
    watcher: FileWatcher,
    extractor: Extractor,
    router: ThresholdRouter,
    store: Arc<dyn SensorStore>,
    notifier: Arc<dyn Notifier>,
    retry: RetryPolicy,
    alerts: OperatorAlerts,
}

impl Pipeline {
    /// Build the pipeline from a config snapshot. Later config changes do not
    /// reach an existing pipeline.
    pub fn new(
        config: &WindTurbineConfig,
        store: Arc<dyn SensorStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let pipeline = config.pipeline.clone();
        Self {
            watcher: FileWatcher::from_config(&pipeline),
            extractor: Extractor::new(pipeline.resolved_path()),
            router: ThresholdRouter::new(pipeline.temperature_threshold),
            recipient: config.notify.recipient.clone(),
            alerts: OperatorAlerts::new(notifier.clone(), &config.notify, &pipeline.name),
            retry: RetryPolicy::from_config(&config.schedule),
            config: pipeline,
            store,
            notifier,
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn alerts(&self) -> &OperatorAlerts {
        &self.alerts
    }

    /// Execute one run for the given schedule slot.
    pub async fn execute(&self, logical_date: DateTime<Utc>) -> RunOutcome {
        let mut ctx = RunContext::new(logical_date);
        tracing::info!(
            run_id = ctx.run_id(),
            "▶️ '{}' run for {} started",
            self.config.name,
            logical_date.to_rfc3339()
        );

        let mut tasks = Vec::with_capacity(2 + DOWNSTREAM.len());

        let watcher = &self.watcher;
        let (record, found) = self.attempt(&ctx, TASK_WAIT_FOR_FILE, || watcher.wait()).await;
        tasks.push(record);
        if found.is_none() {
            tasks.push(TaskRecord::upstream_failed(TASK_EXTRACT));
            tasks.extend(DOWNSTREAM.iter().map(|name| TaskRecord::upstream_failed(name)));
            return self.finish(ctx, tasks);
        }

        let extractor = &self.extractor;
        let (mut record, reading) = self
            .attempt(&ctx, TASK_EXTRACT, || async move { extractor.read_reading() })
            .await;
        let published = match reading {
            Some(reading) => match extractor.publish(&mut ctx, &reading) {
                Ok(()) => true,
                Err(e) => {
                    let task = TaskRef { run_id: ctx.run_id(), task: TASK_EXTRACT };
                    self.alerts.task_failed(task, record.attempts, &e).await;
                    record.status = failed(&e);
                    false
                }
            },
            None => false,
        };
        tasks.push(record);
        if !published {
            tasks.extend(DOWNSTREAM.iter().map(|name| TaskRecord::upstream_failed(name)));
            return self.finish(ctx, tasks);
        }

        let (database, notification) =
            tokio::join!(self.database_branch(&ctx), self.notify_branch(&ctx));
        tasks.extend(database);
        tasks.extend(notification);

        self.finish(ctx, tasks)
    }

    /// `create_table → insert_reading`
    async fn database_branch(&self, ctx: &RunContext) -> Vec<TaskRecord> {
        let store = &self.store;

        let (record, schema) = self.attempt(ctx, TASK_CREATE_TABLE, || store.ensure_schema()).await;
        if schema.is_none() {
            return vec![record, TaskRecord::upstream_failed(TASK_INSERT_READING)];
        }
        ctx.mark(RunState::SchemaReady);

        let reading = match ctx.reading() {
            Ok(reading) => reading,
            Err(e) => {
                return vec![record, TaskRecord::new(TASK_INSERT_READING, failed(&e), 0)];
            }
        };
        let reading = &reading;
        let (insert, inserted) = self
            .attempt(ctx, TASK_INSERT_READING, || store.insert(reading))
            .await;
        if inserted.is_some() {
            ctx.mark(RunState::Recorded);
            tracing::info!(run_id = ctx.run_id(), "💾 Reading '{}' stored in {}", reading.id, store.name());
        }
        vec![record, insert]
    }

    /// `route_temperature → notify_alert | notify_normal`
    async fn notify_branch(&self, ctx: &RunContext) -> Vec<TaskRecord> {
        let router = &self.router;

        let (record, branch) = self
            .attempt(ctx, TASK_ROUTE_TEMPERATURE, || async move { router.route(ctx) })
            .await;
        let Some(branch) = branch else {
            return vec![
                record,
                TaskRecord::upstream_failed(TASK_NOTIFY_ALERT),
                TaskRecord::upstream_failed(TASK_NOTIFY_NORMAL),
            ];
        };

        let (selected, skipped) = match branch {
            Branch::Alert => (TASK_NOTIFY_ALERT, TASK_NOTIFY_NORMAL),
            Branch::Normal => (TASK_NOTIFY_NORMAL, TASK_NOTIFY_ALERT),
        };
        let message = message_for(branch, &self.config.name, &self.recipient);
        let message = &message;
        let notifier = &self.notifier;
        let (sent, delivered) = self.attempt(ctx, selected, || notifier.send(message)).await;
        if delivered.is_some() {
            ctx.mark(RunState::Notified);
            tracing::info!(run_id = ctx.run_id(), "📧 '{}' sent to {} via {}", message.subject, message.to, notifier.name());
        }

        let mut records = vec![record, sent, TaskRecord::skipped(skipped)];
        records.sort_by_key(|r| report_position(&r.name));
        records
    }

    /// Run one task under the retry policy and report the final failure.
    async fn attempt<T, F, Fut>(
        &self,
        ctx: &RunContext,
        name: &str,
        op: F,
    ) -> (TaskRecord, Option<T>)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let task = TaskRef { run_id: ctx.run_id(), task: name };
        let Attempted { result, attempts } = self.retry.run(task, &self.alerts, op).await;
        match result {
            Ok(value) => (TaskRecord::new(name, TaskStatus::Success, attempts), Some(value)),
            Err(e) => {
                self.alerts.task_failed(task, attempts, &e).await;
                (TaskRecord::new(name, failed(&e), attempts), None)
            }
        }
    }

    fn finish(&self, ctx: RunContext, tasks: Vec<TaskRecord>) -> RunOutcome {
        let summary = RunSummary {
            run_id: ctx.run_id().to_string(),
            logical_date: ctx.logical_date(),
            started_at: ctx.started_at(),
            finished_at: Utc::now(),
            tasks,
        };

        if summary.is_success() && ctx.is_complete() {
            tracing::info!(run_id = %summary.run_id, "🏁 '{}' run complete", self.config.name);
        } else {
            let failed: Vec<&str> = summary.failed_tasks().map(|t| t.name.as_str()).collect();
            tracing::warn!(
                run_id = %summary.run_id,
                "⚠️ '{}' run incomplete (failed: {})",
                self.config.name,
                if failed.is_empty() { "none".to_string() } else { failed.join(", ") }
            );
        }

        RunOutcome { summary, context: ctx }
    }
}

#[async_trait]
impl Job for Pipeline {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn run(&self, logical_date: DateTime<Utc>) -> RunSummary {
        self.execute(logical_date).await.summary
    }
}

fn failed(e: &windturbine_core::WindTurbineError) -> TaskStatus {
    TaskStatus::Failed(format!("{}: {e}", e.kind()))
}

fn report_position(name: &str) -> usize {
    DOWNSTREAM.iter().position(|t| *t == name).unwrap_or(DOWNSTREAM.len())
}
