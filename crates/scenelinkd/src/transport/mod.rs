//! TCP transport for the automation endpoint.
//!
//! The transport binds the configured endpoint and holds at most one client
//! connection. A newly accepted client always displaces the current one. All
//! socket work is non-blocking so the server loop can interleave accepting,
//! reading, and dispatching on a single thread.

mod connection;
mod errors;
mod listener;
mod manager;

pub use self::connection::{CloseReason, ConnectionId, Disconnect};
pub use self::errors::ListenerError;
pub use self::manager::{Accepted, ConnectionManager, ReadBatch};

const TRANSPORT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
