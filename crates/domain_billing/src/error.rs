//! Billing domain errors

use thiserror::Error;

use domain_documents::DocumentError;
use domain_numbering::NumberingError;

use crate::ports::StoreError;

/// Errors that can occur in the billing domain
#[derive(Debug, Error)]
pub enum BillingError {
    /// Input violates a structural invariant; raised before any write
    #[error("Validation error: {0}")]
    Validation(String),

    /// A contract carries an interval outside the supported set
    ///
    /// A data-integrity error: fatal for that contract's run, recorded as
    /// FAILED and not retried automatically.
    #[error("Unknown billing interval '{0}'")]
    UnknownInterval(String),

    /// Number allocation failed
    #[error(transparent)]
    Numbering(#[from] NumberingError),

    /// Document construction or validation failed
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// The backing store failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BillingError {
    pub fn validation(message: impl Into<String>) -> Self {
        BillingError::Validation(message.into())
    }
}
