//! Error types for listener operations.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Errors surfaced while binding or running the TCP listener.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Host name resolution failed.
    #[error("failed to resolve TCP address {host}:{port}: {source}")]
    Resolve {
        /// Configured host.
        host: String,
        /// Configured port.
        port: u16,
        /// Resolver error.
        #[source]
        source: io::Error,
    },
    /// Resolution succeeded but produced no addresses.
    #[error("no TCP addresses resolved for {host}:{port}")]
    ResolveEmpty {
        /// Configured host.
        host: String,
        /// Configured port.
        port: u16,
    },
    /// The port is unavailable or the address cannot be bound.
    #[error("failed to bind TCP listener at {addr}: {source}")]
    BindTcp {
        /// Address the bind was attempted on.
        addr: SocketAddr,
        /// Bind error.
        #[source]
        source: io::Error,
    },
    /// Switching the listener to non-blocking mode failed.
    #[error("failed to enable non-blocking listener: {source}")]
    NonBlocking {
        /// Socket option error.
        #[source]
        source: io::Error,
    },
    /// `start` was called on a manager that is already listening.
    #[error("listener already running on {addr}")]
    AlreadyRunning {
        /// Address currently bound.
        addr: SocketAddr,
    },
    /// The network thread could not be created.
    #[error("failed to spawn server thread: {source}")]
    Spawn {
        /// Thread creation error.
        #[source]
        source: io::Error,
    },
    /// The server thread panicked.
    #[error("server thread panicked")]
    ThreadPanic,
}
