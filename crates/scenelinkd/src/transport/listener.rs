//! Binding and non-blocking accept for the TCP listener.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};

use scenelink_config::ListenEndpoint;

use super::ListenerError;

/// Resolves the endpoint and binds a non-blocking listener on the first
/// address returned.
pub(super) fn bind_tcp(endpoint: &ListenEndpoint) -> Result<TcpListener, ListenerError> {
    let host = endpoint.host();
    let port = endpoint.port();
    let mut addrs = (host, port)
        .to_socket_addrs()
        .map_err(|source| ListenerError::Resolve {
            host: host.to_owned(),
            port,
            source,
        })?;
    let addr = addrs
        .find(|addr| matches!(addr, SocketAddr::V4(_) | SocketAddr::V6(_)))
        .ok_or_else(|| ListenerError::ResolveEmpty {
            host: host.to_owned(),
            port,
        })?;
    let listener =
        TcpListener::bind(addr).map_err(|source| ListenerError::BindTcp { addr, source })?;
    listener
        .set_nonblocking(true)
        .map_err(|source| ListenerError::NonBlocking { source })?;
    Ok(listener)
}

/// Accepts one pending connection, returning `None` when nobody is waiting.
pub(super) fn accept_pending(
    listener: &TcpListener,
) -> Result<Option<(TcpStream, SocketAddr)>, io::Error> {
    match listener.accept() {
        Ok(accepted) => Ok(Some(accepted)),
        Err(error) if error.kind() == io::ErrorKind::WouldBlock => Ok(None),
        Err(error) => Err(error),
    }
}
