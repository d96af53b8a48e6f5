//! Error types for request parsing and dispatch.
//!
//! Each variant maps to one JSON-RPC error code. Operation failures are not
//! represented here: they are folded into successful `tools/call` results.

use thiserror::Error;

use scenelink_protocol::{ErrorCode, RequestId, Response};

use crate::bridge::BridgeError;

/// Errors that produce a JSON-RPC error envelope.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The frame was not valid JSON.
    #[error("malformed JSON: {message}")]
    Parse {
        /// Parser diagnostic.
        message: String,
    },
    /// The JSON was not a request object.
    #[error("invalid request: {message}")]
    InvalidRequest {
        /// Identifier recovered from the frame, when it had a usable one.
        id: Option<RequestId>,
        /// What was wrong with it.
        message: String,
    },
    /// The method is not supported.
    #[error("method not found: {method}")]
    MethodNotFound {
        /// Requested method.
        method: String,
    },
    /// The method parameters were missing or malformed.
    #[error("invalid params: {message}")]
    InvalidParams {
        /// What was wrong with them.
        message: String,
    },
    /// A result could not be encoded.
    #[error("internal error: {message}")]
    Internal {
        /// Encoder diagnostic.
        message: String,
    },
    /// The privileged context did not produce a result.
    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

impl ProtocolError {
    pub(crate) fn parse(error: &serde_json::Error) -> Self {
        Self::Parse {
            message: error.to_string(),
        }
    }

    pub(crate) fn invalid_request(id: Option<RequestId>, message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            id,
            message: message.into(),
        }
    }

    pub(crate) fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams {
            message: message.into(),
        }
    }

    /// JSON-RPC code for the failure.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Parse { .. } => ErrorCode::ParseError,
            Self::InvalidRequest { .. } => ErrorCode::InvalidRequest,
            Self::MethodNotFound { .. } => ErrorCode::MethodNotFound,
            Self::InvalidParams { .. } => ErrorCode::InvalidParams,
            Self::Internal { .. } | Self::Bridge(_) => ErrorCode::InternalError,
        }
    }

    /// Message placed on the wire.
    ///
    /// Client-side faults use the canonical JSON-RPC messages that existing
    /// clients match on. Bridge faults carry the detail so operators can tell
    /// a stalled host from a failed operation.
    #[must_use]
    pub fn wire_message(&self) -> String {
        match self {
            Self::Bridge(error) => format!("{}: {error}", self.code().message()),
            _ => self.code().message().to_owned(),
        }
    }

    /// Builds the error envelope, answering `id` or the recovered id.
    #[must_use]
    pub fn into_response(self, id: Option<RequestId>) -> Response {
        let id = match &self {
            Self::Parse { .. } => None,
            Self::InvalidRequest { id: recovered, .. } => recovered.clone(),
            _ => id,
        };
        Response::failure(
            id.unwrap_or_else(RequestId::sentinel),
            self.code(),
            self.wire_message(),
        )
    }
}
