//! Database error types
//!
//! This module defines the error types that can occur during database
//! operations and maps PostgreSQL error codes onto them.

use thiserror::Error;

/// Errors that can occur during database operations
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to establish a database connection
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Entity not found in database
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// Unique constraint violation; the message names the constraint
    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// A bounded lock wait expired before the lock was granted
    #[error("Lock not available: {0}")]
    LockNotAvailable(String),

    /// Migration error
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Pool exhaustion - no available connections
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// A stored value could not be mapped back to its domain type
    #[error("Invalid stored value: {0}")]
    InvalidValue(String),

    /// Generic SQL error
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Creates a not found error for a specific entity type and identifier
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        DatabaseError::NotFound(format!("{} with id '{}' not found", entity, id))
    }

    /// Creates an invalid value error for a column that failed domain mapping
    pub fn invalid_value(column: &str, value: impl std::fmt::Display) -> Self {
        DatabaseError::InvalidValue(format!("{} = '{}'", column, value))
    }

    /// Checks if this error indicates a record was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::NotFound(_))
    }

    /// Checks if this error is a bounded lock wait that expired
    pub fn is_lock_timeout(&self) -> bool {
        matches!(self, DatabaseError::LockNotAvailable(_))
    }

    /// Checks if this error is a unique violation on the named constraint
    pub fn violates_constraint(&self, constraint: &str) -> bool {
        matches!(self, DatabaseError::DuplicateEntry(message) if message.contains(constraint))
    }
}

/// Converts SQLx errors to more specific DatabaseError variants
///
/// Maps PostgreSQL error codes onto variants; see
/// https://www.postgresql.org/docs/current/errcodes-appendix.html
impl From<&sqlx::Error> for DatabaseError {
    fn from(error: &sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("Record not found".to_string()),
            sqlx::Error::PoolTimedOut => DatabaseError::PoolExhausted,
            sqlx::Error::Database(db_err) => {
                if let Some(code) = db_err.code() {
                    match code.as_ref() {
                        "23505" => {
                            let constraint = db_err.constraint().unwrap_or("unique constraint");
                            DatabaseError::DuplicateEntry(format!(
                                "{}: {}",
                                constraint,
                                db_err.message()
                            ))
                        }
                        "23503" => {
                            DatabaseError::ForeignKeyViolation(db_err.message().to_string())
                        }
                        "23514" => {
                            DatabaseError::ConstraintViolation(db_err.message().to_string())
                        }
                        "55P03" => DatabaseError::LockNotAvailable(db_err.message().to_string()),
                        _ => DatabaseError::QueryFailed(db_err.message().to_string()),
                    }
                } else {
                    DatabaseError::QueryFailed(db_err.message().to_string())
                }
            }
            _ => DatabaseError::QueryFailed(error.to_string()),
        }
    }
}

/// Translates database faults into the billing store error surface
impl From<DatabaseError> for domain_billing::StoreError {
    fn from(error: DatabaseError) -> Self {
        use domain_billing::StoreError;
        match error {
            DatabaseError::NotFound(message) => StoreError::NotFound(message),
            DatabaseError::DuplicateEntry(message)
            | DatabaseError::ForeignKeyViolation(message)
            | DatabaseError::ConstraintViolation(message) => StoreError::Conflict(message),
            DatabaseError::ConnectionFailed(message) => StoreError::Unavailable(message),
            DatabaseError::PoolExhausted => {
                StoreError::Unavailable("connection pool exhausted".to_string())
            }
            other => StoreError::Internal(other.to_string()),
        }
    }
}
