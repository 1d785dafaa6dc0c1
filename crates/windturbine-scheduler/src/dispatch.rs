//! Operator notice dispatch: tells a human when a task is retried or gives up.
//!
//! These notices are separate from the pipeline's own alert / normal messages:
//! they go to `notify.operator_email` and describe the failing task, not the
//! sensor reading.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use windturbine_core::config::NotifyConfig;
use windturbine_core::error::WindTurbineError;
use windturbine_core::traits::Notifier;
use windturbine_core::types::Message;

use crate::notify::{Notification, NotifyLog, NotifyPriority};
use crate::tasks::{RetryObserver, TaskRef};

pub struct OperatorAlerts {
    notifier: Arc<dyn Notifier>,
    to: String,
    pipeline: String,
    on_failure: bool,
    on_retry: bool,
    log: Mutex<NotifyLog>,
}

impl OperatorAlerts {
    pub fn new(notifier: Arc<dyn Notifier>, config: &NotifyConfig, pipeline: &str) -> Self {
        Self {
            notifier,
            to: config.operator_address().to_string(),
            pipeline: pipeline.to_string(),
            on_failure: config.email_on_failure,
            on_retry: config.email_on_retry,
            log: Mutex::new(NotifyLog::new()),
        }
    }

    /// Notice for a task that exhausted its retries.
    pub fn failure_notice(&self, task: TaskRef<'_>, attempts: u32, error: &WindTurbineError) -> Message {
        Message {
            to: self.to.clone(),
            subject: format!("[{}] Task failed: {}", self.pipeline, task.task),
            html_body: format!(
                "<h3>Task failed.</h3>\n<p>Pipeline: {}</p>\n<p>Task: {}</p>\n<p>Run: {}</p>\n<p>Attempts: {}</p>\n<p>Error ({}): {}</p>",
                self.pipeline,
                task.task,
                task.run_id,
                attempts,
                error.kind(),
                escape_html(&error.to_string())
            ),
        }
    }

    /// Notice for a task about to be retried.
    pub fn retry_notice(&self, task: TaskRef<'_>, attempt: u32, error: &WindTurbineError) -> Message {
        Message {
            to: self.to.clone(),
            subject: format!("[{}] Task retry: {}", self.pipeline, task.task),
            html_body: format!(
                "<h3>Task will be retried.</h3>\n<p>Pipeline: {}</p>\n<p>Task: {}</p>\n<p>Run: {}</p>\n<p>Failed attempt: {}</p>\n<p>Error ({}): {}</p>",
                self.pipeline,
                task.task,
                task.run_id,
                attempt,
                error.kind(),
                escape_html(&error.to_string())
            ),
        }
    }

    /// Report a task's final failure. Delivery problems are logged, not
    /// returned: the task has already failed and nothing downstream waits on
    /// this notice.
    pub async fn task_failed(&self, task: TaskRef<'_>, attempts: u32, error: &WindTurbineError) {
        if !self.on_failure {
            return;
        }
        let message = self.failure_notice(task, attempts, error);
        self.deliver(&message, task, NotifyPriority::Urgent).await;
    }

    pub fn history(&self) -> Vec<Notification> {
        match self.log.lock() {
            Ok(log) => log.history().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    async fn deliver(&self, message: &Message, task: TaskRef<'_>, priority: NotifyPriority) {
        let delivered = match self.notifier.send(message).await {
            Ok(()) => {
                tracing::info!(run_id = task.run_id, "📨 Operator notified: {}", message.subject);
                true
            }
            Err(e) => {
                tracing::error!(run_id = task.run_id, "⚠️ Operator notice for '{}' not delivered: {e}", task.task);
                false
            }
        };
        let source = format!("{}/{}", task.run_id, task.task);
        if let Ok(mut log) = self.log.lock() {
            log.record(NotifyLog::create(&message.subject, &message.to, &source, priority, delivered));
        }
    }
}

#[async_trait]
impl RetryObserver for OperatorAlerts {
    async fn on_retry(&self, task: TaskRef<'_>, attempt: u32, error: &WindTurbineError) {
        if !self.on_retry {
            return;
        }
        let message = self.retry_notice(task, attempt, error);
        self.deliver(&message, task, NotifyPriority::High).await;
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
