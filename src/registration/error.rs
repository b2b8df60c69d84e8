use crate::certificates::CertificateError;
use crate::directory::DirectoryError;
use crate::inventory::InventoryError;

/// Anything that stops a batch from being registered
///
/// None of these reach the caller directly; they collapse into a generic
/// registration failure.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error(transparent)]
    Certificate(#[from] CertificateError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error("Department {0} not found")]
    DepartmentNotFound(uuid::Uuid),

    #[error("Certificate type {0} not found")]
    TypeNotFound(i32),

    #[error("Club {0} not found")]
    ClubNotFound(i32),

    #[error("No inventory item configured for certificate type {certificate_type_id} in this department")]
    MissingInventoryItem { certificate_type_id: i32 },

    #[error("Tender method \"{0}\" is not available for the department")]
    MissingTender(String),

    #[error("Transaction document could not be written: {0}")]
    Document(#[from] quick_xml::Error),
}
