//! Numbering domain errors

use thiserror::Error;

/// Errors that can occur during number allocation
#[derive(Debug, Error)]
pub enum NumberingError {
    /// The per-scope lock could not be acquired within the configured bound
    ///
    /// The allocation left no partial state; the caller may retry.
    #[error("Could not lock number range '{scope}' within {timeout_ms}ms")]
    LockTimeout { scope: String, timeout_ms: u64 },

    /// The format template references an unknown token
    #[error("Invalid number format template '{0}'")]
    InvalidTemplate(String),

    /// The stored counter would move backwards
    #[error("Sequence for '{scope}' would regress from {current} to {attempted}")]
    SequenceRegression {
        scope: String,
        current: i64,
        attempted: i64,
    },

    /// The backing store failed
    #[error("Number range store error: {0}")]
    Store(String),
}

impl NumberingError {
    pub fn store(message: impl Into<String>) -> Self {
        NumberingError::Store(message.into())
    }

    /// Returns true if the caller may retry the allocation
    pub fn is_retryable(&self) -> bool {
        matches!(self, NumberingError::LockTimeout { .. })
    }
}
