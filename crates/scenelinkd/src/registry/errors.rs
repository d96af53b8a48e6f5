//! Error types raised by operations and registry construction.

use thiserror::Error;

/// Failure reported by an operation. Rendered to clients as `Error: <message>`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OperationError {
    /// A required argument was absent.
    #[error("Missing required argument '{name}'")]
    MissingArgument {
        /// Argument name.
        name: String,
    },
    /// An argument had the wrong type or an unacceptable value.
    #[error("Invalid argument '{name}': {message}")]
    InvalidArgument {
        /// Argument name.
        name: String,
        /// What was wrong with it.
        message: String,
    },
    /// The operation ran but could not complete.
    #[error("{0}")]
    Failed(String),
}

impl OperationError {
    /// Shorthand for [`OperationError::Failed`].
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Shorthand for [`OperationError::InvalidArgument`].
    #[must_use]
    pub fn invalid(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Errors raised while building an [`OperationRegistry`](super::OperationRegistry).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Two operations share a name.
    #[error("operation '{name}' is already registered")]
    DuplicateOperation {
        /// The clashing name.
        name: String,
    },
    /// An operation was registered with an empty name.
    #[error("operation names must not be empty")]
    EmptyName,
}
