//! Last-connect-wins connection manager.

use std::io;
use std::net::{SocketAddr, TcpListener};

use tracing::{debug, info, warn};

use scenelink_config::ListenEndpoint;
use scenelink_protocol::{DEFAULT_MAX_FRAME_BYTES, Frame};

use super::connection::{ClientConnection, CloseReason, ConnectionId, Disconnect};
use super::listener::{accept_pending, bind_tcp};
use super::{ListenerError, TRANSPORT_TARGET};

/// A client accepted by [`ConnectionManager::poll`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    /// Identifier of the new connection.
    pub id: ConnectionId,
    /// Remote address of the new client.
    pub peer: SocketAddr,
    /// The connection it replaced, if one was active.
    pub displaced: Option<Disconnect>,
}

/// Frames read by [`ConnectionManager::read_available`].
#[derive(Debug, Default)]
pub struct ReadBatch {
    /// Connection the frames arrived on.
    pub connection: Option<ConnectionId>,
    /// Complete frames in arrival order.
    pub frames: Vec<Frame>,
    /// Set when the connection was released during or before this read.
    pub closed: Option<Disconnect>,
}

/// Owns the listening socket and at most one client connection.
///
/// The manager never blocks: `poll` accepts only connections that are already
/// pending and `read_available` returns only bytes that have already arrived.
pub struct ConnectionManager {
    listener: Option<TcpListener>,
    local_addr: Option<SocketAddr>,
    connection: Option<ClientConnection>,
    pending_disconnect: Option<Disconnect>,
    max_frame_bytes: usize,
    next_id: u64,
    last_accept_error: Option<io::ErrorKind>,
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_BYTES)
    }
}

impl ConnectionManager {
    /// Builds a stopped manager whose connections buffer at most
    /// `max_frame_bytes` per frame.
    #[must_use]
    pub fn new(max_frame_bytes: usize) -> Self {
        Self {
            listener: None,
            local_addr: None,
            connection: None,
            pending_disconnect: None,
            max_frame_bytes,
            next_id: 0,
            last_accept_error: None,
        }
    }

    /// Binds the endpoint and starts accepting clients.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::AlreadyRunning`] when a listener is active,
    /// or the resolution and bind failures reported by the operating system.
    pub fn start(&mut self, endpoint: &ListenEndpoint) -> Result<SocketAddr, ListenerError> {
        if let Some(addr) = self.local_addr {
            return Err(ListenerError::AlreadyRunning { addr });
        }
        let listener = bind_tcp(endpoint)?;
        let addr = listener
            .local_addr()
            .map_err(|source| ListenerError::NonBlocking { source })?;
        info!(
            target: TRANSPORT_TARGET,
            endpoint = %endpoint,
            addr = %addr,
            "listener bound"
        );
        self.listener = Some(listener);
        self.local_addr = Some(addr);
        self.last_accept_error = None;
        Ok(addr)
    }

    /// Whether a listener is bound.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.listener.is_some()
    }

    /// Address the listener is bound to.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Accepts at most one pending client. The new client replaces any
    /// current connection, whose socket is shut down first.
    pub fn poll(&mut self) -> Option<Accepted> {
        let listener = self.listener.as_ref()?;
        let (stream, peer) = match accept_pending(listener) {
            Ok(Some(accepted)) => {
                self.last_accept_error = None;
                accepted
            }
            Ok(None) => return None,
            Err(error) => {
                let kind = error.kind();
                if self.last_accept_error != Some(kind) {
                    warn!(
                        target: TRANSPORT_TARGET,
                        error = %error,
                        "socket accept error"
                    );
                }
                self.last_accept_error = Some(kind);
                return None;
            }
        };

        let displaced = self.release(CloseReason::Displaced);
        self.next_id += 1;
        let id = ConnectionId::new(self.next_id);
        match ClientConnection::new(id, stream, peer, self.max_frame_bytes) {
            Ok(connection) => {
                info!(
                    target: TRANSPORT_TARGET,
                    connection = %id,
                    peer = %peer,
                    displaced = displaced.is_some(),
                    "client connected"
                );
                self.connection = Some(connection);
                Some(Accepted {
                    id,
                    peer,
                    displaced,
                })
            }
            Err(error) => {
                warn!(
                    target: TRANSPORT_TARGET,
                    peer = %peer,
                    error = %error,
                    "failed to configure accepted socket"
                );
                self.pending_disconnect = displaced;
                None
            }
        }
    }

    /// Whether a client is connected and still sending.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection
            .as_ref()
            .is_some_and(|connection| !connection.peer_closed())
    }

    /// Identifier of the current connection, if any.
    #[must_use]
    pub fn current_connection(&self) -> Option<ConnectionId> {
        self.connection.as_ref().map(ClientConnection::id)
    }

    /// Reads whatever bytes are available and returns the frames they
    /// complete.
    ///
    /// A client that closed its write side keeps its connection until the
    /// next call so replies to its final frames can still be delivered.
    /// Read faults and oversized frames release the connection immediately.
    pub fn read_available(&mut self) -> ReadBatch {
        let mut batch = ReadBatch {
            closed: self.pending_disconnect.take(),
            ..ReadBatch::default()
        };

        if self
            .connection
            .as_ref()
            .is_some_and(ClientConnection::peer_closed)
        {
            batch.closed = self.release(CloseReason::PeerClosed);
            return batch;
        }

        let Some(connection) = self.connection.as_mut() else {
            return batch;
        };
        batch.connection = Some(connection.id());
        match connection.read_available() {
            Ok(frames) => batch.frames = frames,
            Err(reason) => {
                warn!(
                    target: TRANSPORT_TARGET,
                    connection = %connection.id(),
                    reason = %reason,
                    "dropping client connection"
                );
                batch.closed = self.release(reason);
            }
        }
        batch
    }

    /// Writes a reply to the current connection.
    ///
    /// Best effort: a failed write is logged, not retried, and releases the
    /// connection. Returns whether the bytes were written.
    pub fn send(&mut self, bytes: &[u8]) -> bool {
        let Some(connection) = self.connection.as_mut() else {
            debug!(
                target: TRANSPORT_TARGET,
                bytes = bytes.len(),
                "no client connected; reply discarded"
            );
            return false;
        };
        match connection.send(bytes) {
            Ok(()) => true,
            Err(error) => {
                warn!(
                    target: TRANSPORT_TARGET,
                    connection = %connection.id(),
                    error = %error,
                    "failed to send reply"
                );
                self.pending_disconnect = self.release(CloseReason::SendFailed(error.kind()));
                false
            }
        }
    }

    /// Closes the client connection and the listener.
    pub fn stop(&mut self) -> Option<Disconnect> {
        let closed = self.release(CloseReason::Stopped);
        if let Some(addr) = self.local_addr.take() {
            info!(target: TRANSPORT_TARGET, addr = %addr, "listener closed");
        }
        self.listener = None;
        self.pending_disconnect = None;
        closed
    }

    fn release(&mut self, reason: CloseReason) -> Option<Disconnect> {
        let connection = self.connection.take()?;
        let disconnect = Disconnect {
            id: connection.id(),
            peer: connection.peer(),
            reason,
        };
        connection.close();
        debug!(
            target: TRANSPORT_TARGET,
            connection = %disconnect.id,
            reason = %disconnect.reason,
            "client connection released"
        );
        Some(disconnect)
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.close();
        }
    }
}
