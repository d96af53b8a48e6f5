//! Error types for the execution bridge.

use std::time::Duration;

use thiserror::Error;

/// Failures of the hand-off itself, as opposed to failures reported by an
/// operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// No result arrived within the configured bound.
    #[error("invocation of '{name}' timed out after {timeout:?}")]
    TimedOut {
        /// Operation name.
        name: String,
        /// Bound that elapsed.
        timeout: Duration,
    },
    /// The task was dropped without running, for example because the
    /// context shut down with work still queued.
    #[error("invocation of '{name}' was abandoned by the execution context")]
    Abandoned {
        /// Operation name.
        name: String,
    },
    /// The context no longer accepts work.
    #[error("execution context is closed; cannot invoke '{name}'")]
    ContextClosed {
        /// Operation name.
        name: String,
    },
}
