//! Document domain errors

use thiserror::Error;

/// Errors that can occur in the document domain
///
/// All variants are structural validation failures raised before any write;
/// a document that fails validation is never partially persisted.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Input violates a structural invariant
    #[error("Validation error: {0}")]
    Validation(String),

    /// The document type requires a due date and none is set
    #[error("Document type '{0}' requires a due date")]
    MissingDueDate(String),

    /// Correction documents must reference the document they correct
    #[error("Correction document '{0}' has no source document reference")]
    CorrectionWithoutSource(String),
}

impl DocumentError {
    pub fn validation(message: impl Into<String>) -> Self {
        DocumentError::Validation(message.into())
    }
}
