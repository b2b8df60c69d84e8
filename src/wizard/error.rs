use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::cache::CacheError;
use crate::certificates::CertificateError;
use crate::directory::DirectoryError;
use crate::validation::FieldErrors;

pub const STEP1_INCOMPLETE: &str = "You must complete this step before proceeding.";

/// Error types for the issuance wizard
#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("Please correct the errors below")]
    Fields(FieldErrors),

    #[error("{}", STEP1_INCOMPLETE)]
    Step1Incomplete,

    #[error("No submission to confirm")]
    NothingToConfirm,

    #[error("Certificate group {0} not found")]
    GroupNotFound(i32),

    #[error("This batch is already being submitted")]
    DuplicateSubmission,

    #[error("Session storage error: {0}")]
    Session(#[from] CacheError),

    #[error(transparent)]
    Certificate(#[from] CertificateError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

impl From<FieldErrors> for WizardError {
    fn from(errors: FieldErrors) -> Self {
        WizardError::Fields(errors)
    }
}

impl IntoResponse for WizardError {
    fn into_response(self) -> Response {
        if let WizardError::Certificate(err) = self {
            return err.into_response();
        }

        let (status, body) = match &self {
            WizardError::Fields(errors) => {
                tracing::debug!("Wizard form errors: {:?}", errors);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    json!({ "error": self.to_string(), "details": errors }),
                )
            }
            // The client goes back to the step it still has to complete
            WizardError::Step1Incomplete | WizardError::NothingToConfirm => (
                StatusCode::CONFLICT,
                json!({ "error": self.to_string(), "redirect": "step1" }),
            ),
            WizardError::GroupNotFound(_) => {
                (StatusCode::NOT_FOUND, json!({ "error": self.to_string() }))
            }
            WizardError::DuplicateSubmission => {
                tracing::warn!("Duplicate certificate batch submission");
                (StatusCode::CONFLICT, json!({ "error": self.to_string() }))
            }
            WizardError::Certificate(_) | WizardError::Session(_) | WizardError::Directory(_) => {
                tracing::error!("Wizard operation failed: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "An internal server error occurred" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
