//! JSON-RPC request handling.
//!
//! Frames arrive from the transport, are decoded by [`Request::parse`], and
//! are routed by the [`ProtocolEngine`]. Tool invocations cross to the
//! privileged context through the [`ExecutionBridge`](crate::bridge::ExecutionBridge).

mod engine;
mod errors;
mod request;

pub use self::engine::{Method, ProtocolEngine, SERVER_NAME, SessionState};
pub use self::errors::ProtocolError;
pub use self::request::Request;

const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
