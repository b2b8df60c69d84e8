use crate::directory::DirectoryError;

/// Error types for delivery emails
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Mail relay unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Mail relay rejected the message with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error("Email outbox unavailable: {0}")]
    Outbox(#[from] sqlx::Error),

    #[error("Email payload could not be encoded: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Department {0} not found")]
    DepartmentNotFound(uuid::Uuid),
}
