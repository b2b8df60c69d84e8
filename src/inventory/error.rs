use crate::xml::XmlError;

/// Failures talking to the inventory system
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("Inventory transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Inventory system returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Inventory SOAP fault: {0}")]
    Fault(String),

    #[error("Unexpected inventory response: {0}")]
    Protocol(String),
}

impl From<XmlError> for InventoryError {
    fn from(err: XmlError) -> Self {
        InventoryError::Protocol(err.to_string())
    }
}
