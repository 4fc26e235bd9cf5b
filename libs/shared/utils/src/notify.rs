use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

/// Fire-and-forget webhook client for the external notification sender.
/// Delivery is best-effort: failures are logged and never surfaced to the
/// caller, so a slow or broken notification endpoint cannot affect a
/// committed booking or finalization.
#[derive(Clone)]
pub struct Notifier {
    client: Client,
    webhook_url: Option<String>,
}

impl Notifier {
    pub fn new(webhook_url: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap_or_default();
        Self {
            client,
            webhook_url,
        }
    }

    /// Deliver an event payload after the core transaction has committed.
    pub async fn send(&self, event: &str, payload: Value) {
        let Some(url) = &self.webhook_url else {
            debug!("Notification '{}' skipped, no webhook configured", event);
            return;
        };

        let body = serde_json::json!({
            "event": event,
            "data": payload,
        });

        match self.client.post(url).json(&body).send().await {
            Ok(response) if response.status().is_success() => {
                debug!("Notification '{}' delivered", event);
            }
            Ok(response) => {
                warn!(
                    "Notification '{}' rejected by webhook ({})",
                    event,
                    response.status()
                );
            }
            Err(e) => {
                warn!("Notification '{}' failed: {}", event, e);
            }
        }
    }
}
