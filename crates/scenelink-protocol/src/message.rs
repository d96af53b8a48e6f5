//! JSON-RPC 2.0 envelopes and error codes.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Protocol version tag carried by every envelope.
pub const JSONRPC_VERSION: &str = "2.0";

/// Method names understood by the daemon.
pub mod method {
    /// Handshake request.
    pub const INITIALIZE: &str = "initialize";
    /// Client acknowledgement of the handshake; never answered.
    pub const INITIALIZED: &str = "notifications/initialized";
    /// Operation discovery.
    pub const TOOLS_LIST: &str = "tools/list";
    /// Operation invocation.
    pub const TOOLS_CALL: &str = "tools/call";
}

/// Request identifier echoed back in the matching response.
///
/// Integers are the documented form. String ids are accepted and echoed
/// verbatim so generic JSON-RPC clients interoperate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Numeric identifier.
    Number(i64),
    /// Integer identifier above `i64::MAX`.
    Unsigned(u64),
    /// String identifier.
    Text(String),
}

impl RequestId {
    /// Identifier used when none could be recovered from the request.
    #[must_use]
    pub const fn sentinel() -> Self {
        Self::Number(0)
    }

    /// Interprets a raw JSON value as an identifier.
    ///
    /// Returns `None` for floats, booleans, arrays, objects, and `null`.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => number
                .as_i64()
                .map(Self::Number)
                .or_else(|| number.as_u64().map(Self::Unsigned)),
            Value::String(text) => Some(Self::Text(text.clone())),
            _ => None,
        }
    }
}

impl From<i64> for RequestId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(number) => write!(formatter, "{number}"),
            Self::Unsigned(number) => write!(formatter, "{number}"),
            Self::Text(text) => write!(formatter, "\"{text}\""),
        }
    }
}

/// JSON-RPC error codes emitted by the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The frame was not valid JSON.
    ParseError,
    /// The JSON was not a valid request object.
    InvalidRequest,
    /// The method is not supported.
    MethodNotFound,
    /// The method parameters were missing or malformed.
    InvalidParams,
    /// The daemon could not complete the request, for example because the
    /// host never answered an invocation.
    InternalError,
}

impl ErrorCode {
    /// Numeric code placed on the wire.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
        }
    }

    /// Canonical message for the code.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ParseError => "Parse error",
            Self::InvalidRequest => "Invalid Request",
            Self::MethodNotFound => "Method not found",
            Self::InvalidParams => "Invalid params",
            Self::InternalError => "Internal error",
        }
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.code())
    }
}

/// The `error` member of a failure envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorObject {
    /// JSON-RPC error code.
    pub code: ErrorCode,
    /// Human-readable description.
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
enum Outcome {
    Result(Value),
    Error(ErrorObject),
}

/// A reply envelope: either `{jsonrpc, id, result}` or `{jsonrpc, id, error}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    jsonrpc: &'static str,
    id: RequestId,
    #[serde(flatten)]
    outcome: Outcome,
}

impl Response {
    /// Builds a success envelope.
    #[must_use]
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            outcome: Outcome::Result(result),
        }
    }

    /// Builds a failure envelope.
    #[must_use]
    pub fn failure(id: RequestId, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            outcome: Outcome::Error(ErrorObject {
                code,
                message: message.into(),
            }),
        }
    }

    /// Identifier the response answers.
    #[must_use]
    pub fn id(&self) -> &RequestId {
        &self.id
    }

    /// Result payload for success envelopes.
    #[must_use]
    pub fn result(&self) -> Option<&Value> {
        match &self.outcome {
            Outcome::Result(value) => Some(value),
            Outcome::Error(_) => None,
        }
    }

    /// Error member for failure envelopes.
    #[must_use]
    pub fn error(&self) -> Option<&ErrorObject> {
        match &self.outcome {
            Outcome::Result(_) => None,
            Outcome::Error(error) => Some(error),
        }
    }

    /// Serialises the envelope as compact JSON followed by the frame
    /// delimiter.
    ///
    /// # Errors
    ///
    /// Returns the serialisation error if the result payload cannot be
    /// encoded.
    pub fn to_line(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut line = serde_json::to_vec(self)?;
        line.push(b'\n');
        Ok(line)
    }
}
