//! Common error types for brewlog
//!
//! Storage driver failures are reclassified into [`Error::StorageUnavailable`]
//! or [`Error::Storage`] by the store gateway only. Not-found lookups are not
//! errors; see [`crate::store::Lookup`].

use thiserror::Error;

/// Common result type for brewlog operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across brewlog services
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or missing client input
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The store could not be reached within the configured timeout
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Any other storage-layer rejection
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Client input that cannot be turned into a document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was absent or null
    #[error("missing required field '{field}'")]
    Missing { field: String },

    /// A field was present but could not be coerced to its target type
    #[error("invalid value for field '{field}': {reason}")]
    Invalid { field: String, reason: String },

    /// An identifier that is not a 24-character hex object id
    #[error("invalid identifier '{0}'")]
    InvalidId(String),
}

impl ValidationError {
    pub fn missing(field: &str) -> Self {
        ValidationError::Missing {
            field: field.to_string(),
        }
    }

    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ValidationError::Invalid {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Name of the offending field, when the failure is tied to one
    pub fn field(&self) -> Option<&str> {
        match self {
            ValidationError::Missing { field } | ValidationError::Invalid { field, .. } => {
                Some(field)
            }
            ValidationError::InvalidId(_) => None,
        }
    }
}
