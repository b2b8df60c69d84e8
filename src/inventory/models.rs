use serde::{Deserialize, Serialize};

/// Accounting bucket a transaction amount can be allocated to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenderMethod {
    pub name: String,
    pub guid: String,
    pub procedure: String,
}

/// Result of submitting a transaction document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTicketResponse {
    /// `CreateTicketsResult`
    pub result: bool,
    /// `a_sMessage`: an XML error list or plain text, when present
    pub message: Option<String>,
}

impl CreateTicketResponse {
    pub fn accepted() -> Self {
        Self {
            result: true,
            message: None,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            result: false,
            message: Some(message.into()),
        }
    }
}
