//! # Windturbine Channels
//! Notification delivery for the pipeline's alert / normal messages and for
//! operator failure notices.

pub mod email;
pub mod log;
pub mod webhook;

use std::sync::Arc;

use windturbine_core::config::{NotifyChannelKind, NotifyConfig};
use windturbine_core::error::{Result, WindTurbineError};
use windturbine_core::traits::Notifier;

pub use email::EmailNotifier;
pub use log::LogNotifier;
pub use webhook::WebhookNotifier;

/// Build the notifier selected by `notify.channel`.
pub fn build_notifier(config: &NotifyConfig) -> Result<Arc<dyn Notifier>> {
    match config.channel {
        NotifyChannelKind::Email => {
            let smtp = config
                .smtp
                .clone()
                .ok_or_else(|| WindTurbineError::Config("Missing [notify.smtp]".into()))?;
            Ok(Arc::new(EmailNotifier::new(smtp)))
        }
        NotifyChannelKind::Webhook => {
            let webhook = config
                .webhook
                .clone()
                .ok_or_else(|| WindTurbineError::Config("Missing [notify.webhook]".into()))?;
            Ok(Arc::new(WebhookNotifier::new(webhook)?))
        }
        NotifyChannelKind::Log => Ok(Arc::new(LogNotifier)),
    }
}
