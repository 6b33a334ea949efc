//! Push delivery backends.

use async_trait::async_trait;
use tracing::{info, warn};

use prepdrill_common::PushMessage;

/// Delivery backend for push messages. Returns the provider's message id.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &PushMessage) -> anyhow::Result<String>;
}

/// Logs messages instead of delivering them. Used when no push gateway
/// is configured.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn send(&self, message: &PushMessage) -> anyhow::Result<String> {
        info!(
            user_id = message.user_id,
            title = %message.title,
            "Push delivery disabled, logging message"
        );
        Ok(format!("noop-{}", message.user_id))
    }
}

/// Posts each message as JSON to a push gateway webhook.
pub struct WebhookNotifier {
    webhook_url: String,
    http: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(webhook_url: String) -> Self {
        Self {
            webhook_url,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, message: &PushMessage) -> anyhow::Result<String> {
        let resp = self
            .http
            .post(&self.webhook_url)
            .json(message)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            warn!(status = %status, body = %body, "Push webhook returned non-success");
            anyhow::bail!("push webhook returned {status}");
        }

        // Gateways that return a message id do so as {"message_id": "..."}.
        let message_id = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("message_id").and_then(|id| id.as_str().map(String::from)))
            .unwrap_or_else(|| format!("webhook-{}", message.user_id));

        Ok(message_id)
    }
}
