//! Email alerts over SMTP with STARTTLS.

use super::{AlertDispatcher, DeliveryOutcome, PriceAlert};
use crate::config::SmtpSettings;
use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

pub struct EmailNotifier {
    from: Mailbox,
    to: Mailbox,
    currency: String,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl EmailNotifier {
    /// Validate the addresses and prepare the SMTP transport. No connection is
    /// made until the first alert.
    pub fn new(settings: SmtpSettings, currency: &str) -> Result<Self> {
        let from: Mailbox = settings
            .username
            .parse()
            .with_context(|| format!("invalid EMAIL_USER address: {}", settings.username))?;
        let to: Mailbox = settings
            .recipient
            .parse()
            .with_context(|| format!("invalid NOTIFICATION_EMAIL address: {}", settings.recipient))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.server)
            .with_context(|| format!("invalid SMTP server: {}", settings.server))?
            .port(settings.port)
            .credentials(Credentials::new(settings.username, settings.password))
            .build();

        Ok(Self {
            from,
            to,
            currency: currency.to_string(),
            transport,
        })
    }

    fn message(&self, alert: &PriceAlert) -> Result<Message> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(super::subject(alert))
            .header(ContentType::TEXT_PLAIN)
            .body(super::body(alert, &self.currency))?;
        Ok(message)
    }
}

#[async_trait]
impl AlertDispatcher for EmailNotifier {
    async fn notify(&self, alert: &PriceAlert) -> DeliveryOutcome {
        let message = match self.message(alert) {
            Ok(m) => m,
            Err(e) => return DeliveryOutcome::Failed(format!("could not build email: {e:#}")),
        };
        match self.transport.send(message).await {
            Ok(_) => {
                info!("alert email sent for {}", alert.product.label());
                DeliveryOutcome::Delivered
            }
            Err(e) => DeliveryOutcome::Failed(format!("failed to send email: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::tests::sample_alert;

    fn settings() -> SmtpSettings {
        SmtpSettings {
            server: "smtp.example.com".to_string(),
            port: 587,
            username: "watcher@example.com".to_string(),
            password: "app-password".to_string(),
            recipient: "me@example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn test_builds_message() {
        let notifier = EmailNotifier::new(settings(), "₹").unwrap();
        let formatted = String::from_utf8(notifier.message(&sample_alert()).unwrap().formatted())
            .unwrap();
        assert!(formatted.contains("Subject: Price Alert for Steel Kettle!"));
        assert!(formatted.contains("To: me@example.com"));
    }

    #[tokio::test]
    async fn test_rejects_bad_address() {
        let mut bad = settings();
        bad.recipient = "not an address".to_string();
        assert!(EmailNotifier::new(bad, "₹").is_err());
    }
}
