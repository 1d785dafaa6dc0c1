//! Log-only channel for dry runs: records the message in the log and drops it.

use async_trait::async_trait;

use windturbine_core::error::Result;
use windturbine_core::traits::Notifier;
use windturbine_core::types::Message;

pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, message: &Message) -> Result<()> {
        tracing::info!(
            to = %message.to,
            "📢 [{}] {}",
            message.subject,
            message.html_body.replace('\n', " ")
        );
        Ok(())
    }
}
