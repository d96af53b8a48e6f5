//! A single accepted client connection and its frame buffer.

use std::fmt;
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use scenelink_protocol::{Frame, FrameBuffer, FrameError};

const READ_CHUNK: usize = 4096;
// Bounds the bytes drained per call so a flooding client cannot starve the
// accept path.
const READ_BUDGET: usize = 64;
const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Monotonic identifier assigned to each accepted connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub(super) const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw identifier value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "#{}", self.0)
    }
}

/// Why a connection was released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// The client closed its end of the stream.
    PeerClosed,
    /// A newer client took over the endpoint.
    Displaced,
    /// The client sent a frame larger than the configured bound.
    Oversized {
        /// Bytes buffered when the limit tripped.
        size: usize,
        /// Configured limit.
        max: usize,
    },
    /// Reading from the socket failed.
    ReadFailed(io::ErrorKind),
    /// Writing a reply failed.
    SendFailed(io::ErrorKind),
    /// The manager was stopped.
    Stopped,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PeerClosed => formatter.write_str("peer closed the connection"),
            Self::Displaced => formatter.write_str("displaced by a newer client"),
            Self::Oversized { size, max } => {
                write!(formatter, "frame of {size} bytes exceeds {max} byte limit")
            }
            Self::ReadFailed(kind) => write!(formatter, "read failed: {kind}"),
            Self::SendFailed(kind) => write!(formatter, "send failed: {kind}"),
            Self::Stopped => formatter.write_str("server stopped"),
        }
    }
}

impl From<FrameError> for CloseReason {
    fn from(error: FrameError) -> Self {
        match error {
            FrameError::Oversized { size, max } => Self::Oversized { size, max },
        }
    }
}

/// A connection that has been released by the manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disconnect {
    /// Identifier of the released connection.
    pub id: ConnectionId,
    /// Remote address of the released connection.
    pub peer: SocketAddr,
    /// Why it was released.
    pub reason: CloseReason,
}

pub(super) struct ClientConnection {
    id: ConnectionId,
    peer: SocketAddr,
    stream: TcpStream,
    frames: FrameBuffer,
    peer_closed: bool,
}

impl ClientConnection {
    pub(super) fn new(
        id: ConnectionId,
        stream: TcpStream,
        peer: SocketAddr,
        max_frame_bytes: usize,
    ) -> io::Result<Self> {
        stream.set_nonblocking(true)?;
        stream.set_nodelay(true)?;
        stream.set_write_timeout(Some(WRITE_TIMEOUT))?;
        Ok(Self {
            id,
            peer,
            stream,
            frames: FrameBuffer::new(max_frame_bytes),
            peer_closed: false,
        })
    }

    pub(super) fn id(&self) -> ConnectionId {
        self.id
    }

    pub(super) fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// True once the client has closed its write side. Replies may still be
    /// delivered until the manager releases the connection.
    pub(super) fn peer_closed(&self) -> bool {
        self.peer_closed
    }

    /// Drains whatever bytes the socket has ready and returns the frames they
    /// complete.
    pub(super) fn read_available(&mut self) -> Result<Vec<Frame>, CloseReason> {
        let mut chunk = [0_u8; READ_CHUNK];
        let mut frames = Vec::new();
        for _ in 0..READ_BUDGET {
            match self.stream.read(&mut chunk) {
                Ok(0) => {
                    self.peer_closed = true;
                    break;
                }
                Ok(read) => {
                    let Some(bytes) = chunk.get(..read) else {
                        break;
                    };
                    frames.extend(self.frames.push(bytes)?);
                }
                Err(error) if error.kind() == io::ErrorKind::WouldBlock => break,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                Err(error) => return Err(CloseReason::ReadFailed(error.kind())),
            }
        }
        Ok(frames)
    }

    /// Writes the bytes in full, blocking up to the write timeout.
    pub(super) fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.stream.set_nonblocking(false)?;
        let written = self
            .stream
            .write_all(bytes)
            .and_then(|()| self.stream.flush());
        self.stream.set_nonblocking(true)?;
        written
    }

    pub(super) fn close(self) {
        // The peer may already be gone; nothing useful to do on failure.
        drop(self.stream.shutdown(Shutdown::Both));
    }
}
