//! Core error types
//!
//! Input-validation errors raised before any remote call is made.

use thiserror::Error;

/// Error for malformed caller input.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A declared or observed collection contained the same identity twice.
    ///
    /// Duplicate identities are a caller error; the engine does not
    /// deduplicate on anyone's behalf.
    #[error("duplicate identity '{id}' in entity collection")]
    DuplicateIdentity { id: String },

    /// A classification value outside the allowed set, such as an
    /// unrecognized membership kind.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

impl CoreError {
    /// Create an invalid-input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        CoreError::InvalidInput {
            message: message.into(),
        }
    }
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
