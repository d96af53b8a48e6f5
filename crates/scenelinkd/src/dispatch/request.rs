//! Request parsing for the dispatch loop.
//!
//! Frames are decoded into a generic JSON value first so that the request id
//! can be recovered for error replies even when the rest of the envelope is
//! malformed.

use serde_json::{Map, Value};

use scenelink_protocol::RequestId;

use super::errors::ProtocolError;

/// A decoded JSON-RPC request.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Requested method.
    pub method: String,
    /// Identifier to echo. `None` marks a notification.
    pub id: Option<RequestId>,
    /// Parameters, when supplied.
    pub params: Option<Value>,
}

impl Request {
    /// Parses one frame.
    ///
    /// Leading and trailing whitespace is ignored. The `jsonrpc` member is
    /// not enforced.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Parse`] for invalid JSON and
    /// [`ProtocolError::InvalidRequest`] when the value is not an object, the
    /// id has an unusable type, or `method` is missing or not a string.
    pub fn parse(frame: &[u8]) -> Result<Self, ProtocolError> {
        let value: Value =
            serde_json::from_slice(frame.trim_ascii()).map_err(|error| ProtocolError::parse(&error))?;
        let Value::Object(mut object) = value else {
            return Err(ProtocolError::invalid_request(
                None,
                "request must be a JSON object",
            ));
        };

        let id = parse_id(&object)?;
        let method = match object.remove("method") {
            Some(Value::String(method)) => method,
            Some(_) => {
                return Err(ProtocolError::invalid_request(id, "method must be a string"));
            }
            None => return Err(ProtocolError::invalid_request(id, "method is required")),
        };
        let params = object.remove("params").filter(|params| !params.is_null());

        Ok(Self { method, id, params })
    }

    /// Whether the request expects no reply.
    #[must_use]
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

fn parse_id(object: &Map<String, Value>) -> Result<Option<RequestId>, ProtocolError> {
    match object.get("id") {
        None => Ok(None),
        Some(raw) => RequestId::from_value(raw).map(Some).ok_or_else(|| {
            ProtocolError::invalid_request(None, "id must be an integer or a string")
        }),
    }
}
