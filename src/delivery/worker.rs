use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::delivery::{retry_backoff, DeliveryError, EmailOutbox, Mailer, PendingEmail, MAX_ATTEMPTS};

const BATCH_SIZE: i64 = 50;

/// Sends due outbox emails
///
/// Delivery is at least once: an email is removed from the outbox only after the
/// mailer accepted it.
#[derive(Clone)]
pub struct DeliveryWorker {
    outbox: Arc<dyn EmailOutbox>,
    mailer: Arc<dyn Mailer>,
    poll_interval: Duration,
    lease: Duration,
}

impl DeliveryWorker {
    pub fn new(outbox: Arc<dyn EmailOutbox>, mailer: Arc<dyn Mailer>, poll_interval: Duration) -> Self {
        Self {
            outbox,
            mailer,
            poll_interval,
            lease: Duration::from_secs(300),
        }
    }

    /// Send everything currently due
    ///
    /// # Returns
    /// The number of emails sent
    pub async fn drain_due(&self) -> Result<usize, DeliveryError> {
        let mut sent = 0;
        loop {
            let now = Utc::now();
            let claimed = self.outbox.claim_due(now, self.lease, BATCH_SIZE).await?;
            if claimed.is_empty() {
                return Ok(sent);
            }
            let full = claimed.len() as i64 == BATCH_SIZE;

            for pending in claimed {
                if self.deliver(pending).await? {
                    sent += 1;
                }
            }

            if !full {
                return Ok(sent);
            }
        }
    }

    async fn deliver(&self, pending: PendingEmail) -> Result<bool, DeliveryError> {
        match self.mailer.send(&pending.email).await {
            Ok(()) => {
                self.outbox.complete(pending.id).await?;
                tracing::info!(
                    "Delivery email for certificate batch {:?} sent to {}",
                    pending.batch_id,
                    pending.email.to.join(", ")
                );
                Ok(true)
            }
            Err(e) => {
                let backoff = retry_backoff(pending.attempts);
                if pending.attempts >= MAX_ATTEMPTS {
                    tracing::error!(
                        "Delivery email {} to {} failed {} times, giving up: {}",
                        pending.id,
                        pending.email.to.join(", "),
                        pending.attempts,
                        e
                    );
                } else {
                    tracing::warn!(
                        "Delivery email {} to {} failed, retrying in {:?}: {}",
                        pending.id,
                        pending.email.to.join(", "),
                        backoff,
                        e
                    );
                }
                let due_at = Utc::now()
                    + chrono::Duration::from_std(backoff).unwrap_or_else(|_| chrono::Duration::hours(1));
                self.outbox.retry_at(pending.id, due_at, &e.to_string()).await?;
                Ok(false)
            }
        }
    }

    /// Poll the outbox until the handle is stopped or dropped
    pub fn spawn(self) -> DeliveryWorkerHandle {
        let (cancel_tx, mut cancel_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            tracing::info!("Delivery worker started, polling every {:?}", self.poll_interval);
            loop {
                if let Err(e) = self.drain_due().await {
                    tracing::error!("Delivery worker pass failed: {}", e);
                }

                tokio::select! {
                    _ = tokio::time::sleep(self.poll_interval) => {}
                    changed = cancel_rx.changed() => {
                        if changed.is_err() || *cancel_rx.borrow() {
                            tracing::info!("Delivery worker stopped");
                            break;
                        }
                    }
                }
            }
        });

        DeliveryWorkerHandle {
            cancel: cancel_tx,
            task,
        }
    }
}

pub struct DeliveryWorkerHandle {
    cancel: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl DeliveryWorkerHandle {
    /// Stop polling and wait for the current pass to finish
    pub async fn stop(self) {
        let _ = self.cancel.send(true);
        if let Err(e) = self.task.await {
            tracing::error!("Delivery worker ended abnormally: {}", e);
        }
    }
}
