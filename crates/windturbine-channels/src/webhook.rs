//! Generic HTTP webhook channel: POSTs the message as JSON.

use async_trait::async_trait;
use std::time::Duration;

use windturbine_core::config::WebhookConfig;
use windturbine_core::error::{Result, WindTurbineError};
use windturbine_core::traits::Notifier;
use windturbine_core::types::Message;

pub struct WebhookNotifier {
    config: WebhookConfig,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(config: WebhookConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| WindTurbineError::Config(format!("HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    /// JSON body posted for a message.
    pub fn payload(message: &Message) -> serde_json::Value {
        serde_json::json!({
            "to": message.to,
            "subject": message.subject,
            "html": message.html_body,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn send(&self, message: &Message) -> Result<()> {
        let mut req = self.client.post(&self.config.url).json(&Self::payload(message));
        for (key, value) in &self.config.headers {
            req = req.header(key.as_str(), value.as_str());
        }

        let resp = req
            .send()
            .await
            .map_err(|e| WindTurbineError::Delivery(format!("Webhook send failed: {e}")))?;

        if resp.status().is_success() {
            tracing::info!("✅ Webhook notification sent to {}: {}", self.config.url, message.subject);
            Ok(())
        } else {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            Err(WindTurbineError::Delivery(format!("Webhook error {status}: {body}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_carries_static_message() {
        let message = Message {
            to: "ops@example.com".into(),
            subject: "Windturbine Advisory".into(),
            html_body: "<h3>Normal temperatures.</h3>".into(),
        };
        let payload = WebhookNotifier::payload(&message);
        assert_eq!(payload["to"], "ops@example.com");
        assert_eq!(payload["subject"], "Windturbine Advisory");
        assert_eq!(payload["html"], "<h3>Normal temperatures.</h3>");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_delivery_error() {
        let notifier = WebhookNotifier::new(WebhookConfig {
            url: "http://127.0.0.1:9/hook".into(),
            headers: vec![("X-Token".into(), "abc".into())],
            timeout_secs: 2,
        })
        .unwrap();
        let message = Message {
            to: "ops@example.com".into(),
            subject: "s".into(),
            html_body: "b".into(),
        };
        let err = notifier.send(&message).await.unwrap_err();
        assert!(matches!(err, WindTurbineError::Delivery(_)));
    }
}
