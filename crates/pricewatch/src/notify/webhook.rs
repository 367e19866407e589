//! Webhook alerts: a JSON POST per alert.

use super::{AlertDispatcher, DeliveryOutcome, PriceAlert};
use async_trait::async_trait;
use std::time::Duration;
use tracing::info;

pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            url: url.to_string(),
        }
    }
}

/// JSON body posted to the webhook.
pub fn payload(alert: &PriceAlert) -> serde_json::Value {
    serde_json::json!({
        "product_id": alert.product.id,
        "name": alert.product.name,
        "url": alert.product.url,
        "current_price": alert.current_price,
        "previous_price": alert.previous_price,
        "threshold": alert.product.threshold,
        "dropped": alert.dropped,
        "observed_at": alert.observed_at.to_rfc3339(),
    })
}

#[async_trait]
impl AlertDispatcher for WebhookNotifier {
    async fn notify(&self, alert: &PriceAlert) -> DeliveryOutcome {
        let resp = self.client.post(&self.url).json(&payload(alert)).send().await;
        match resp {
            Ok(r) if r.status().is_success() => {
                info!("alert webhook delivered for {}", alert.product.label());
                DeliveryOutcome::Delivered
            }
            Ok(r) => DeliveryOutcome::Failed(format!("webhook returned HTTP {}", r.status())),
            Err(e) => DeliveryOutcome::Failed(format!("webhook request failed: {e}")),
        }
    }
}
