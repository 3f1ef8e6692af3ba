//! Error types for the HR Ops core library

use thiserror::Error;

/// Result type alias for HR Ops operations
pub type Result<T> = std::result::Result<T, HrOpsError>;

/// Main error type for HR Ops operations
#[derive(Error, Debug)]
pub enum HrOpsError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A write needed an identity value that the session has not resolved
    #[error("Cannot write {entity}: {field} is not available in the current session")]
    MissingIdentity {
        entity: String,
        field: &'static str,
    },

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: i64 },

    /// A single-row read matched zero or several rows
    #[error("Expected exactly one {entity}, found {rows}")]
    NotSingle { entity: String, rows: usize },

    #[error("{operation} on {entity} timed out")]
    Timeout {
        entity: String,
        operation: &'static str,
    },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Unknown error: {message}")]
    Unknown { message: String },
}

impl HrOpsError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an unknown error
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown {
            message: message.into(),
        }
    }

    /// Create a missing-identity error for a write on `entity`
    pub fn missing_identity(entity: impl Into<String>, field: &'static str) -> Self {
        Self::MissingIdentity {
            entity: entity.into(),
            field,
        }
    }

    /// Whether this error comes from an unresolved session identity
    #[must_use]
    pub const fn is_missing_identity(&self) -> bool {
        matches!(self, Self::MissingIdentity { .. })
    }
}

impl From<sqlx::Error> for HrOpsError {
    fn from(error: sqlx::Error) -> Self {
        Self::Database(error.to_string())
    }
}

impl From<rusqlite::Error> for HrOpsError {
    fn from(error: rusqlite::Error) -> Self {
        Self::Database(error.to_string())
    }
}
