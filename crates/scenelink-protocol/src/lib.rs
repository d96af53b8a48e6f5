//! Wire types shared by the scenelink daemon and its clients.
//!
//! Clients speak line-delimited JSON-RPC 2.0 over a stream socket: one message
//! per line, terminated by `\n`. This crate owns the pieces of that contract
//! that do not depend on the daemon runtime:
//!
//! - [`FrameBuffer`] turns an arbitrary sequence of socket reads into whole
//!   frames, keeping partial lines buffered until their delimiter arrives.
//! - [`Response`] and [`ErrorCode`] describe the reply envelopes and the
//!   JSON-RPC error codes the daemon emits.
//! - [`OperationDescriptor`], [`InitializeResult`], and [`CallToolResult`]
//!   model the result payloads of the supported methods.

mod frame;
mod message;
mod tools;

pub use frame::{DEFAULT_MAX_FRAME_BYTES, Frame, FrameBuffer, FrameError};
pub use message::{ErrorCode, ErrorObject, JSONRPC_VERSION, RequestId, Response, method};
pub use tools::{
    CallToolResult, InitializeResult, OperationDescriptor, PROTOCOL_VERSION, ServerCapabilities,
    ServerInfo, ToolContent, ToolsCapability, ToolsListResult,
};
