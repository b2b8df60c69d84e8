// Durable queue of delivery emails
// Emails are written here at issuance and removed once the relay accepted them, so a
// restart between issuance and the send time loses nothing

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

use crate::delivery::{DeliveryEmail, DeliveryError};

/// Attempts after which an email stays in the outbox for inspection only
pub const MAX_ATTEMPTS: i32 = 10;

/// An email claimed for sending
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEmail {
    pub id: Uuid,
    pub batch_id: Option<i32>,
    pub email: DeliveryEmail,
    /// Attempts including the current one
    pub attempts: i32,
}

#[async_trait]
pub trait EmailOutbox: Send + Sync {
    /// Store an email to be sent at `due_at`
    async fn enqueue(
        &self,
        batch_id: Option<i32>,
        email: &DeliveryEmail,
        due_at: DateTime<Utc>,
    ) -> Result<Uuid, DeliveryError>;

    /// Claim up to `limit` due emails
    ///
    /// A claimed email is hidden for `lease`; if its worker dies before completing it,
    /// it becomes due again afterwards.
    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        lease: Duration,
        limit: i64,
    ) -> Result<Vec<PendingEmail>, DeliveryError>;

    /// Remove a sent email
    async fn complete(&self, id: Uuid) -> Result<(), DeliveryError>;

    /// Record a failed attempt and make the email due again at `due_at`
    async fn retry_at(&self, id: Uuid, due_at: DateTime<Utc>, error: &str) -> Result<(), DeliveryError>;
}

/// Delay before the next attempt: one minute doubling per attempt, at most an hour
pub fn retry_backoff(attempts: i32) -> Duration {
    let exponent = attempts.saturating_sub(1).clamp(0, 6) as u32;
    Duration::from_secs((60 * 2u64.pow(exponent)).min(3600))
}

/// End of a claim lease
pub fn lease_deadline(now: DateTime<Utc>, lease: Duration) -> DateTime<Utc> {
    now + chrono::Duration::from_std(lease).unwrap_or_else(|_| chrono::Duration::minutes(5))
}

#[derive(sqlx::FromRow)]
struct OutboxRow {
    id: Uuid,
    batch_id: Option<i32>,
    payload: String,
    attempts: i32,
}

/// Outbox kept in the `email_outbox` table
#[derive(Clone)]
pub struct PgEmailOutbox {
    pool: PgPool,
}

impl PgEmailOutbox {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmailOutbox for PgEmailOutbox {
    async fn enqueue(
        &self,
        batch_id: Option<i32>,
        email: &DeliveryEmail,
        due_at: DateTime<Utc>,
    ) -> Result<Uuid, DeliveryError> {
        let id = Uuid::new_v4();
        let payload = serde_json::to_string(email)?;

        sqlx::query(
            "INSERT INTO email_outbox (id, batch_id, payload, due_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(batch_id)
        .bind(payload)
        .bind(due_at)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        lease: Duration,
        limit: i64,
    ) -> Result<Vec<PendingEmail>, DeliveryError> {
        // SKIP LOCKED lets several service instances drain the same table
        let rows = sqlx::query_as::<_, OutboxRow>(
            r#"
            UPDATE email_outbox
            SET due_at = $2, attempts = attempts + 1
            WHERE id IN (
                SELECT id FROM email_outbox
                WHERE due_at <= $1 AND attempts < $3
                ORDER BY due_at
                LIMIT $4
                FOR UPDATE SKIP LOCKED
            )
            RETURNING id, batch_id, payload, attempts
            "#,
        )
        .bind(now)
        .bind(lease_deadline(now, lease))
        .bind(MAX_ATTEMPTS)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut pending = Vec::with_capacity(rows.len());
        for row in rows {
            match serde_json::from_str::<DeliveryEmail>(&row.payload) {
                Ok(email) => pending.push(PendingEmail {
                    id: row.id,
                    batch_id: row.batch_id,
                    email,
                    attempts: row.attempts,
                }),
                Err(e) => {
                    tracing::error!("Outbox email {} is unreadable, parking it: {}", row.id, e);
                    sqlx::query("UPDATE email_outbox SET attempts = $2, last_error = $3 WHERE id = $1")
                        .bind(row.id)
                        .bind(MAX_ATTEMPTS)
                        .bind(e.to_string())
                        .execute(&self.pool)
                        .await?;
                }
            }
        }

        Ok(pending)
    }

    async fn complete(&self, id: Uuid) -> Result<(), DeliveryError> {
        sqlx::query("DELETE FROM email_outbox WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn retry_at(&self, id: Uuid, due_at: DateTime<Utc>, error: &str) -> Result<(), DeliveryError> {
        sqlx::query("UPDATE email_outbox SET due_at = $2, last_error = $3 WHERE id = $1")
            .bind(id)
            .bind(due_at)
            .bind(error)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
