//! JSON-RPC state machine.
//!
//! The engine turns one frame into at most one response. Requests carrying an
//! id get exactly one reply; notifications (no id, or the
//! `notifications/initialized` method) are executed but never answered.
//! Routing is by [`Method`], parsed from the method string.

use serde_json::Value;
use tracing::{debug, info};

use scenelink_protocol::{CallToolResult, InitializeResult, Response, ToolsListResult, method};

use crate::bridge::ExecutionBridge;
use crate::registry::Arguments;

use super::DISPATCH_TARGET;
use super::errors::ProtocolError;
use super::request::Request;

/// Server name reported by `initialize`.
pub const SERVER_NAME: &str = "scenelink";

/// Supported methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `initialize`
    Initialize,
    /// `notifications/initialized`
    Initialized,
    /// `tools/list`
    ToolsList,
    /// `tools/call`
    ToolsCall,
}

impl Method {
    /// Maps a method string to a supported method.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::MethodNotFound`] for anything else.
    pub fn parse(name: &str) -> Result<Self, ProtocolError> {
        match name {
            method::INITIALIZE => Ok(Self::Initialize),
            method::INITIALIZED => Ok(Self::Initialized),
            method::TOOLS_LIST => Ok(Self::ToolsList),
            method::TOOLS_CALL => Ok(Self::ToolsCall),
            other => Err(ProtocolError::MethodNotFound {
                method: other.to_owned(),
            }),
        }
    }
}

/// Handshake state. Lives for the whole server process and survives
/// reconnects; it does not gate any method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionState {
    /// No `initialize` seen yet.
    #[default]
    Uninitialized,
    /// `initialize` has been answered at least once.
    Initialized,
}

/// Dispatches decoded frames to the bridge and builds replies.
pub struct ProtocolEngine {
    bridge: ExecutionBridge,
    state: SessionState,
    server_version: String,
}

impl ProtocolEngine {
    /// Builds an engine that reports the crate version during the handshake.
    #[must_use]
    pub fn new(bridge: ExecutionBridge) -> Self {
        Self::with_version(bridge, env!("CARGO_PKG_VERSION"))
    }

    /// Builds an engine that reports `version` during the handshake.
    #[must_use]
    pub fn with_version(bridge: ExecutionBridge, version: impl Into<String>) -> Self {
        Self {
            bridge,
            state: SessionState::default(),
            server_version: version.into(),
        }
    }

    /// Current handshake state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Handles one frame, returning the reply if one is owed.
    pub fn handle_frame(&mut self, frame: &[u8]) -> Option<Response> {
        let request = match Request::parse(frame) {
            Ok(request) => request,
            Err(error) => {
                debug!(
                    target: DISPATCH_TARGET,
                    error = %error,
                    code = error.code().code(),
                    "rejecting frame"
                );
                return Some(error.into_response(None));
            }
        };
        self.handle_request(request)
    }

    /// Handles one decoded request, returning the reply if one is owed.
    pub fn handle_request(&mut self, request: Request) -> Option<Response> {
        let Request { method, id, params } = request;
        debug!(
            target: DISPATCH_TARGET,
            method = %method,
            id = ?id,
            "dispatching request"
        );
        let outcome = Method::parse(&method).and_then(|method| self.route(method, params));
        let id = id?;
        match outcome {
            Ok(Some(result)) => Some(Response::success(id, result)),
            // `notifications/initialized` is never answered, even when a
            // client attaches an id to it.
            Ok(None) => None,
            Err(error) => {
                debug!(
                    target: DISPATCH_TARGET,
                    error = %error,
                    code = error.code().code(),
                    "request failed"
                );
                Some(error.into_response(Some(id)))
            }
        }
    }

    fn route(
        &mut self,
        method: Method,
        params: Option<Value>,
    ) -> Result<Option<Value>, ProtocolError> {
        match method {
            Method::Initialize => self.initialize().map(Some),
            Method::Initialized => Ok(None),
            Method::ToolsList => self.tools_list().map(Some),
            Method::ToolsCall => self.tools_call(params).map(Some),
        }
    }

    fn initialize(&mut self) -> Result<Value, ProtocolError> {
        if self.state == SessionState::Uninitialized {
            info!(target: DISPATCH_TARGET, "session initialised");
        }
        self.state = SessionState::Initialized;
        to_value(&InitializeResult::new(SERVER_NAME, &*self.server_version))
    }

    fn tools_list(&self) -> Result<Value, ProtocolError> {
        to_value(&ToolsListResult {
            tools: self.bridge.registry().descriptors(),
        })
    }

    fn tools_call(&self, params: Option<Value>) -> Result<Value, ProtocolError> {
        let (name, arguments) = call_params(params)?;
        let text = self.bridge.invoke(&name, arguments)?;
        to_value(&CallToolResult::text(text))
    }
}

fn call_params(params: Option<Value>) -> Result<(String, Arguments), ProtocolError> {
    let Some(Value::Object(mut params)) = params else {
        return Err(ProtocolError::invalid_params("params must be an object"));
    };
    let name = match params.remove("name") {
        Some(Value::String(name)) => name,
        _ => return Err(ProtocolError::invalid_params("name must be a string")),
    };
    let arguments = match params.remove("arguments") {
        None | Some(Value::Null) => Arguments::default(),
        Some(Value::Object(map)) => Arguments::new(map),
        Some(_) => return Err(ProtocolError::invalid_params("arguments must be an object")),
    };
    Ok((name, arguments))
}

fn to_value<T: serde::Serialize>(result: &T) -> Result<Value, ProtocolError> {
    serde_json::to_value(result).map_err(|error| ProtocolError::Internal {
        message: error.to_string(),
    })
}
