use crate::certificates::CertificateError;
use crate::directory::DirectoryError;

/// Error types for certificate rendering
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("Certificate type not found: {0}")]
    TypeNotFound(i32),

    #[error("Club not found: {0}")]
    ClubNotFound(i32),

    #[error(transparent)]
    Certificate(#[from] CertificateError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error("Barcode error: {0}")]
    Barcode(String),

    #[error("Image error: {0}")]
    Image(String),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Rendering task failed: {0}")]
    Task(String),
}

impl From<printpdf::Error> for DocumentError {
    fn from(err: printpdf::Error) -> Self {
        DocumentError::Pdf(err.to_string())
    }
}

impl From<DocumentError> for CertificateError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::Certificate(inner) => inner,
            DocumentError::TypeNotFound(id) => CertificateError::TypeNotFound(id),
            DocumentError::ClubNotFound(id) => CertificateError::ClubNotFound(id),
            DocumentError::Directory(DirectoryError::DatabaseError(msg)) => {
                CertificateError::DatabaseError(msg)
            }
            other => CertificateError::Document(other.to_string()),
        }
    }
}
