use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::directory::DirectoryError;
use crate::validation::FieldErrors;

/// Error types for certificate operations
#[derive(Debug, thiserror::Error)]
pub enum CertificateError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Certificate not found")]
    NotFound,

    #[error("Certificate batch not found")]
    BatchNotFound,

    #[error("Certificate type not found: {0}")]
    TypeNotFound(i32),

    #[error("Club not found: {0}")]
    ClubNotFound(i32),

    #[error("No unused certificate code left for prefix {0}")]
    CodeSpaceExhausted(String),

    #[error("Document error: {0}")]
    Document(String),

    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("Invalid certificate request")]
    Validation(FieldErrors),
}

impl From<sqlx::Error> for CertificateError {
    fn from(err: sqlx::Error) -> Self {
        CertificateError::DatabaseError(err.to_string())
    }
}

impl From<DirectoryError> for CertificateError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::DatabaseError(msg) => CertificateError::DatabaseError(msg),
        }
    }
}

impl From<FieldErrors> for CertificateError {
    fn from(errors: FieldErrors) -> Self {
        CertificateError::Validation(errors)
    }
}

impl From<crate::delivery::DeliveryError> for CertificateError {
    fn from(err: crate::delivery::DeliveryError) -> Self {
        CertificateError::Delivery(err.to_string())
    }
}

impl IntoResponse for CertificateError {
    fn into_response(self) -> Response {
        if let CertificateError::Validation(errors) = &self {
            tracing::debug!("Certificate request rejected: {:?}", errors);
            let body = Json(json!({
                "error": self.to_string(),
                "details": errors,
            }));
            return (StatusCode::UNPROCESSABLE_ENTITY, body).into_response();
        }

        let (status, error_message) = match &self {
            CertificateError::NotFound | CertificateError::BatchNotFound => {
                (StatusCode::NOT_FOUND, self.to_string())
            }
            CertificateError::TypeNotFound(_) | CertificateError::ClubNotFound(_) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            CertificateError::Delivery(msg) => {
                tracing::error!("Certificate delivery failed: {}", msg);
                (StatusCode::BAD_GATEWAY, "The email could not be sent".to_string())
            }
            CertificateError::DatabaseError(_)
            | CertificateError::CodeSpaceExhausted(_)
            | CertificateError::Document(_)
            | CertificateError::Validation(_) => {
                tracing::error!("Certificate operation failed: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
