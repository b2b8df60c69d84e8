use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

use crate::certificates::{encode_download_ref, CertificateBatch};
use crate::config::AppConfig;
use crate::delivery::{compose, DeliveryEmail, DeliveryError, EmailContext, EmailOutbox, Mailer};
use crate::directory::Directory;

/// Where and how a batch email goes out
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryOptions {
    /// Send to this address instead of the batch recipient
    pub recipient_email: Option<String>,
    /// Leave the department director and the batch creator off the copy list
    pub skip_bcc: bool,
}

/// Composes and sends the email carrying a batch's download link
#[derive(Clone)]
pub struct DeliveryService {
    directory: Arc<dyn Directory>,
    outbox: Arc<dyn EmailOutbox>,
    mailer: Arc<dyn Mailer>,
    config: Arc<AppConfig>,
}

impl DeliveryService {
    pub fn new(
        directory: Arc<dyn Directory>,
        outbox: Arc<dyn EmailOutbox>,
        mailer: Arc<dyn Mailer>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            directory,
            outbox,
            mailer,
            config,
        }
    }

    pub fn delay(&self) -> Duration {
        self.config.email_delay
    }

    /// Build the batch email
    ///
    /// The download link always names the batch recipient, even when the email is
    /// redirected to another address.
    pub async fn compose(
        &self,
        batch: &CertificateBatch,
        options: &DeliveryOptions,
    ) -> Result<DeliveryEmail, DeliveryError> {
        let download_ref = encode_download_ref(batch.id, &batch.recipient_email);
        let download_url = self.config.download_url(&download_ref);

        let signature = match batch.email_signature_id {
            Some(id) => self.directory.find_signature(id).await?,
            None => None,
        };

        let mut bcc = Vec::new();
        if !options.skip_bcc {
            let department = self
                .directory
                .find_department(batch.department_id)
                .await?
                .ok_or(DeliveryError::DepartmentNotFound(batch.department_id))?;
            if let Some(director) = department.director_email.filter(|e| !e.trim().is_empty()) {
                bcc.push(director);
            }

            if let Some(creator) = self.directory.find_user(batch.creator_id).await? {
                if !creator.email.trim().is_empty() {
                    bcc.push(creator.email);
                }
            }
        }

        let to = options
            .recipient_email
            .as_deref()
            .unwrap_or(&batch.recipient_email);

        Ok(compose(EmailContext {
            locale: batch.locale(),
            recipient_name: &batch.recipient_name,
            recipient_email: to,
            download_url: &download_url,
            signature: signature.as_ref(),
            from_address: &self.config.email_from,
            bcc,
        }))
    }

    /// Compose now and queue the email in the outbox, due after the configured delay
    ///
    /// # Returns
    /// The address the email will go to
    pub async fn schedule(
        &self,
        batch: &CertificateBatch,
        options: &DeliveryOptions,
    ) -> Result<String, DeliveryError> {
        let email = self.compose(batch, options).await?;
        let delay = chrono::Duration::from_std(self.config.email_delay)
            .unwrap_or_else(|_| chrono::Duration::zero());
        self.outbox
            .enqueue(Some(batch.id), &email, Utc::now() + delay)
            .await?;

        let to = email.to.join(", ");
        tracing::info!(
            "Delivery email for certificate batch {} to {} queued for {:?} from now",
            batch.id,
            to,
            self.config.email_delay
        );
        Ok(to)
    }

    /// Compose and send immediately
    ///
    /// # Returns
    /// The address the email was sent to
    pub async fn send_now(
        &self,
        batch: &CertificateBatch,
        options: &DeliveryOptions,
    ) -> Result<String, DeliveryError> {
        let email = self.compose(batch, options).await?;
        self.mailer.send(&email).await?;
        Ok(email.to.join(", "))
    }
}
