// Authentication and authorization error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;
use std::net::IpAddr;
use tracing::{error, warn};

use crate::directory::DirectoryError;

/// Authentication and authorization error types
#[derive(Debug)]
pub enum AuthError {
    // Authentication errors
    InvalidToken,
    ExpiredToken,
    MissingToken,
    /// Token subject is not a known user
    UnknownUser(i32),
    DatabaseError(String),
    TokenGenerationError(String),

    // Authorization errors
    /// Only staff may issue certificates
    NotStaff(i32),
    /// Request came from outside the office whitelist
    OutsideWhitelist { user_id: i32, ip: Option<IpAddr> },
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidToken => write!(f, "Invalid token"),
            AuthError::ExpiredToken => write!(f, "Token has expired"),
            AuthError::MissingToken => write!(f, "Missing authentication token"),
            AuthError::UnknownUser(id) => write!(f, "Unknown user {}", id),
            AuthError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AuthError::TokenGenerationError(msg) => write!(f, "Token generation error: {}", msg),
            AuthError::NotStaff(id) => write!(f, "User {} is not staff", id),
            AuthError::OutsideWhitelist { user_id, ip } => match ip {
                Some(ip) => write!(f, "User {} connected from {} outside the whitelist", user_id, ip),
                None => write!(f, "User {} connected from an unknown address", user_id),
            },
        }
    }
}

impl std::error::Error for AuthError {}

impl From<DirectoryError> for AuthError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::DatabaseError(msg) => AuthError::DatabaseError(msg),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            AuthError::DatabaseError(_) | AuthError::TokenGenerationError(_) => {
                error!("Authentication failed: {}", self)
            }
            _ => warn!("Rejected request: {}", self),
        }

        let body = Json(json!({
            "error": self.error_message(),
        }));

        (status, body).into_response()
    }
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidToken
            | AuthError::ExpiredToken
            | AuthError::MissingToken
            | AuthError::UnknownUser(_) => StatusCode::UNAUTHORIZED,
            AuthError::NotStaff(_) | AuthError::OutsideWhitelist { .. } => StatusCode::FORBIDDEN,
            AuthError::DatabaseError(_) | AuthError::TokenGenerationError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to send to clients
    pub fn error_message(&self) -> String {
        match self {
            AuthError::InvalidToken | AuthError::UnknownUser(_) => "Invalid token".to_string(),
            AuthError::ExpiredToken => "Token has expired".to_string(),
            AuthError::MissingToken => "Missing authentication token".to_string(),
            AuthError::NotStaff(_) | AuthError::OutsideWhitelist { .. } => {
                "You do not have permission to perform this action.".to_string()
            }
            AuthError::DatabaseError(_) | AuthError::TokenGenerationError(_) => {
                "Internal server error".to_string()
            }
        }
    }
}
