//! Alert delivery.
//!
//! The check cycle hands a [`PriceAlert`] to an [`AlertDispatcher`] and logs
//! whatever comes back; delivery never affects the decision itself.

pub mod email;
pub mod webhook;

use crate::config::Config;
use crate::types::Product;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A price at or below its threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceAlert {
    pub product: Product,
    pub current_price: Decimal,
    pub previous_price: Decimal,
    /// Whether this check was also a drop from the previous price.
    pub dropped: bool,
    pub observed_at: DateTime<Utc>,
}

/// What happened to an alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Delivered,
    /// Not attempted, e.g. the channel is not configured.
    Skipped(String),
    Failed(String),
}

/// Sends price alerts somewhere.
#[async_trait]
pub trait AlertDispatcher: Send + Sync {
    async fn notify(&self, alert: &PriceAlert) -> DeliveryOutcome;
}

/// Dispatcher used when no channel is configured.
pub struct DisabledNotifier {
    reason: String,
}

impl DisabledNotifier {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl AlertDispatcher for DisabledNotifier {
    async fn notify(&self, _alert: &PriceAlert) -> DeliveryOutcome {
        DeliveryOutcome::Skipped(self.reason.clone())
    }
}

/// Sends every alert through each channel in turn.
///
/// Delivered if any channel delivered; otherwise the first failure, or
/// skipped when every channel skipped.
pub struct CompositeNotifier {
    channels: Vec<Box<dyn AlertDispatcher>>,
}

impl CompositeNotifier {
    pub fn new(channels: Vec<Box<dyn AlertDispatcher>>) -> Self {
        Self { channels }
    }
}

#[async_trait]
impl AlertDispatcher for CompositeNotifier {
    async fn notify(&self, alert: &PriceAlert) -> DeliveryOutcome {
        let mut delivered = false;
        let mut failure = None;
        let mut skipped = Vec::new();

        for channel in &self.channels {
            match channel.notify(alert).await {
                DeliveryOutcome::Delivered => delivered = true,
                DeliveryOutcome::Failed(reason) => {
                    warn!("alert channel failed: {reason}");
                    failure.get_or_insert(reason);
                }
                DeliveryOutcome::Skipped(reason) => skipped.push(reason),
            }
        }

        if delivered {
            DeliveryOutcome::Delivered
        } else if let Some(reason) = failure {
            DeliveryOutcome::Failed(reason)
        } else {
            DeliveryOutcome::Skipped(skipped.join("; "))
        }
    }
}

/// Build the dispatcher described by `config`.
///
/// Missing or partial email credentials are reported once here; afterwards
/// alerts are quietly skipped rather than failing every cycle.
pub fn from_config(config: &Config) -> Box<dyn AlertDispatcher> {
    let mut channels: Vec<Box<dyn AlertDispatcher>> = Vec::new();

    match &config.smtp {
        Some(smtp) => match email::EmailNotifier::new(smtp.clone(), &config.currency) {
            Ok(notifier) => channels.push(Box::new(notifier)),
            Err(e) => warn!("email alerts disabled: {e:#}"),
        },
        None if config.smtp_incomplete => warn!(
            "email credentials incomplete (need EMAIL_USER, EMAIL_PASSWORD, NOTIFICATION_EMAIL); skipping email alerts"
        ),
        None => {}
    }

    if let Some(url) = &config.webhook_url {
        channels.push(Box::new(webhook::WebhookNotifier::new(
            url,
            config.http_timeout,
        )));
    }

    match channels.len() {
        0 => {
            warn!("no alert channel configured; alerts will only be logged");
            Box::new(DisabledNotifier::new("no alert channel configured"))
        }
        1 => channels.remove(0),
        _ => Box::new(CompositeNotifier::new(channels)),
    }
}

/// Subject line for an alert.
pub fn subject(alert: &PriceAlert) -> String {
    format!("Price Alert for {}!", alert.product.label())
}

/// Plain-text alert body.
pub fn body(alert: &PriceAlert, currency: &str) -> String {
    let headline = if alert.dropped {
        "Price drop detected!"
    } else {
        "Price is still at or below your threshold."
    };
    format!(
        "{headline}\n\n\
         Product: {name}\n\
         URL: {url}\n\n\
         Previous Price: {currency}{previous}\n\
         Current Price:  {currency}{current}\n\n\
         The price is at or below your threshold of {currency}{threshold}.\n",
        name = alert.product.label(),
        url = alert.product.url,
        previous = alert.previous_price,
        current = alert.current_price,
        threshold = alert.product.threshold,
    )
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    pub(crate) fn sample_alert() -> PriceAlert {
        PriceAlert {
            product: Product {
                id: 7,
                url: "https://www.amazon.in/dp/B0KETTLE".to_string(),
                name: Some("Steel Kettle".to_string()),
                threshold: dec!(500),
            },
            current_price: dec!(450),
            previous_price: dec!(600),
            dropped: true,
            observed_at: Utc::now(),
        }
    }

    struct Fixed(DeliveryOutcome, Arc<AtomicUsize>);

    #[async_trait]
    impl AlertDispatcher for Fixed {
        async fn notify(&self, _alert: &PriceAlert) -> DeliveryOutcome {
            self.1.fetch_add(1, Ordering::SeqCst);
            self.0.clone()
        }
    }

    #[tokio::test]
    async fn test_composite_delivered_if_any_channel_delivers() {
        let calls = Arc::new(AtomicUsize::new(0));
        let composite = CompositeNotifier::new(vec![
            Box::new(Fixed(DeliveryOutcome::Failed("smtp down".into()), calls.clone())),
            Box::new(Fixed(DeliveryOutcome::Delivered, calls.clone())),
        ]);
        assert_eq!(
            composite.notify(&sample_alert()).await,
            DeliveryOutcome::Delivered
        );
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_composite_failure_beats_skip() {
        let calls = Arc::new(AtomicUsize::new(0));
        let composite = CompositeNotifier::new(vec![
            Box::new(Fixed(DeliveryOutcome::Skipped("off".into()), calls.clone())),
            Box::new(Fixed(DeliveryOutcome::Failed("500".into()), calls.clone())),
        ]);
        assert_eq!(
            composite.notify(&sample_alert()).await,
            DeliveryOutcome::Failed("500".into())
        );
    }

    #[tokio::test]
    async fn test_unconfigured_dispatcher_skips() {
        let dispatcher = from_config(&Config::default());
        assert!(matches!(
            dispatcher.notify(&sample_alert()).await,
            DeliveryOutcome::Skipped(_)
        ));
    }

    #[test]
    fn test_message_text() {
        let alert = sample_alert();
        assert_eq!(subject(&alert), "Price Alert for Steel Kettle!");
        let text = body(&alert, "₹");
        assert!(text.starts_with("Price drop detected!"));
        assert!(text.contains("Previous Price: ₹600"));
        assert!(text.contains("Current Price:  ₹450"));
        assert!(text.contains("threshold of ₹500"));
        assert!(text.contains("https://www.amazon.in/dp/B0KETTLE"));
    }

    #[test]
    fn test_message_without_drop() {
        let mut alert = sample_alert();
        alert.dropped = false;
        assert!(body(&alert, "$").starts_with("Price is still at or below"));
    }
}
