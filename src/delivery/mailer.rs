use async_trait::async_trait;
use mockall::automock;
use reqwest::Client;
use std::time::Duration;

use crate::delivery::{DeliveryEmail, DeliveryError};

/// Outbound email transport
#[automock]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &DeliveryEmail) -> Result<(), DeliveryError>;
}

/// Posts messages as JSON to an HTTP mail relay
pub struct HttpMailRelay {
    http: Client,
    url: String,
}

impl HttpMailRelay {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, DeliveryError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Mailer for HttpMailRelay {
    async fn send(&self, email: &DeliveryEmail) -> Result<(), DeliveryError> {
        let response = self.http.post(&self.url).json(email).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!("Delivery email sent to {}", email.to.join(", "));
        Ok(())
    }
}

/// Writes messages to the log instead of sending them
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &DeliveryEmail) -> Result<(), DeliveryError> {
        tracing::info!(
            "Delivery email \"{}\" to {} (bcc {}):\n{}",
            email.subject,
            email.to.join(", "),
            email.bcc.join(", "),
            email.text
        );
        Ok(())
    }
}
