//! Notification records: what was sent, to whom, and why.
//! Lightweight: an in-memory ring buffer, no queues.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Notifications kept in memory.
const HISTORY_LIMIT: usize = 100;

/// A notification that was (or failed to be) delivered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub to: String,
    pub priority: NotifyPriority,
    /// Which task/run triggered this.
    pub source: String,
    pub delivered: bool,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NotifyPriority {
    /// Retry notice.
    High,
    /// Final failure.
    Urgent,
}

/// Bounded notification history.
#[derive(Debug, Default)]
pub struct NotifyLog {
    history: VecDeque<Notification>,
}

impl NotifyLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, notification: Notification) {
        self.history.push_back(notification);
        if self.history.len() > HISTORY_LIMIT {
            self.history.pop_front();
        }
    }

    pub fn history(&self) -> impl Iterator<Item = &Notification> {
        self.history.iter()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Create a notification record stamped with the current time.
    pub fn create(title: &str, to: &str, source: &str, priority: NotifyPriority, delivered: bool) -> Notification {
        Notification {
            title: title.to_string(),
            to: to.to_string(),
            priority,
            source: source.to_string(),
            delivered,
            timestamp: chrono::Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_buffer_keeps_latest() {
        let mut log = NotifyLog::new();
        for i in 0..(HISTORY_LIMIT + 5) {
            log.record(NotifyLog::create(&format!("n{i}"), "ops@example.com", "test", NotifyPriority::High, true));
        }
        assert_eq!(log.len(), HISTORY_LIMIT);
        assert_eq!(log.history().next().unwrap().title, "n5");
    }
}
