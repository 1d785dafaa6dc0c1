//! Email channel: SMTP sending via async lettre.
//!
//! Messages go out as HTML. Port 465 uses implicit TLS, every other port
//! upgrades with STARTTLS. Gmail, Outlook and custom relays all work.

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message as LettreMessage, Tokio1Executor,
    message::Mailbox, message::header::ContentType, transport::smtp::authentication::Credentials,
};

use windturbine_core::config::SmtpConfig;
use windturbine_core::error::{Result, WindTurbineError};
use windturbine_core::traits::Notifier;
use windturbine_core::types::Message;

pub struct EmailNotifier {
    config: SmtpConfig,
}

impl EmailNotifier {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    fn sender(&self) -> Result<Mailbox> {
        let address = self
            .config
            .from
            .as_deref()
            .unwrap_or(&self.config.username);
        let name = self.config.display_name.as_deref().unwrap_or("Windturbine");
        format!("{name} <{address}>")
            .parse()
            .map_err(|e| WindTurbineError::Delivery(format!("Invalid from: {e}")))
    }

    /// Build the RFC 5322 message without sending it.
    pub fn build_message(&self, message: &Message) -> Result<LettreMessage> {
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|e| WindTurbineError::Delivery(format!("Invalid to: {e}")))?;

        LettreMessage::builder()
            .from(self.sender()?)
            .to(to)
            .subject(message.subject.as_str())
            .header(ContentType::TEXT_HTML)
            .body(message.html_body.clone())
            .map_err(|e| WindTurbineError::Delivery(format!("Build email: {e}")))
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
        let relay = if self.config.port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)
        };
        let builder = relay
            .map_err(|e| WindTurbineError::Delivery(format!("SMTP relay: {e}")))?
            .port(self.config.port);

        let builder = if self.config.username.is_empty() {
            builder
        } else {
            builder.credentials(Credentials::new(
                self.config.username.clone(),
                self.config.password.clone(),
            ))
        };
        Ok(builder.build())
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn name(&self) -> &str {
        "email"
    }

    async fn send(&self, message: &Message) -> Result<()> {
        let email = self.build_message(message)?;
        self.transport()?
            .send(email)
            .await
            .map_err(|e| WindTurbineError::Delivery(format!("SMTP send: {e}")))?;

        tracing::info!("📤 Email sent to: {}", message.to);
        Ok(())
    }
}
