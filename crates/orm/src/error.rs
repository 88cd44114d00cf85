//! Error types for the persistence core
//!
//! Validation failures are not errors here: they come back as
//! [`ValidationErrors`](rowbound_validation::ValidationErrors) data. Everything
//! in [`ModelError`] is terminal for the operation that produced it.

use rowbound_validation::RuleError;
use thiserror::Error;

/// Result type alias for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// ORM error type alias
pub type OrmError = ModelError;

/// ORM result type alias
pub type OrmResult<T> = ModelResult<T>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// The store rejected or failed to complete a statement
    #[error("Execution error: {0}")]
    Execution(String),

    /// No row matched where exactly one was expected
    #[error("Record not found in table '{table}' with id {id}")]
    NotFound { table: String, id: i64 },

    /// A record or connection cannot be set up as requested
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The validator could not run to completion
    #[error("Validation error: {0}")]
    Validation(String),

    /// Pool creation or connectivity failure
    #[error("Connection error: {0}")]
    Connection(String),

    /// Row data could not be decoded into the record
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Column '{0}' not found")]
    ColumnNotFound(String),
}

impl ModelError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ModelError::NotFound { .. })
    }
}

impl From<sqlx::Error> for ModelError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::ColumnNotFound(column) => ModelError::ColumnNotFound(column),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                ModelError::Connection(err.to_string())
            }
            other => ModelError::Execution(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Serialization(err.to_string())
    }
}

impl From<RuleError> for ModelError {
    fn from(err: RuleError) -> Self {
        ModelError::Validation(err.to_string())
    }
}
