//! Newline-delimited framing over a byte stream.
//!
//! Socket reads do not respect message boundaries: a single read may carry
//! half a message, several messages, or the tail of one and the head of the
//! next. [`FrameBuffer`] accumulates bytes until a `\n` arrives and only then
//! yields the completed frame.

use thiserror::Error;

/// Upper bound on a single frame used when no explicit limit is configured.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 1024 * 1024;

const DELIMITER: u8 = b'\n';

/// One complete protocol message with its delimiter and surrounding
/// whitespace removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame(Vec<u8>);

impl Frame {
    /// Borrows the frame payload.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consumes the frame, returning the payload.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Length of the payload in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the payload is empty. Frames yielded by [`FrameBuffer`] never are.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Errors raised while accumulating frames.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// A frame, complete or still pending, grew past the configured limit.
    #[error("frame of {size} bytes exceeds {max} byte limit")]
    Oversized {
        /// Observed size in bytes.
        size: usize,
        /// Configured maximum in bytes.
        max: usize,
    },
}

/// Accumulates bytes from partial reads and yields whole frames.
#[derive(Debug)]
pub struct FrameBuffer {
    pending: Vec<u8>,
    max_frame_bytes: usize,
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_BYTES)
    }
}

impl FrameBuffer {
    /// Creates an empty buffer that rejects frames longer than
    /// `max_frame_bytes`.
    #[must_use]
    pub fn new(max_frame_bytes: usize) -> Self {
        Self {
            pending: Vec::new(),
            max_frame_bytes,
        }
    }

    /// Appends freshly read bytes and returns every frame they complete, in
    /// arrival order.
    ///
    /// Bytes after the last delimiter stay buffered for the next call.
    /// Whitespace-only segments are skipped and a trailing `\r` is dropped, so
    /// CRLF-terminated clients are accepted too.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Oversized`] when a frame, or the still-pending
    /// partial frame, exceeds the limit. The buffer is cleared in that case.
    pub fn push(&mut self, bytes: &[u8]) -> Result<Vec<Frame>, FrameError> {
        self.pending.extend_from_slice(bytes);

        let Some(last_delimiter) = self.pending.iter().rposition(|byte| *byte == DELIMITER) else {
            return self.check_pending().map(|()| Vec::new());
        };

        let remainder = self.pending.split_off(last_delimiter + 1);
        let complete = std::mem::replace(&mut self.pending, remainder);

        let mut frames = Vec::new();
        for segment in complete.split(|byte| *byte == DELIMITER) {
            let payload = segment.trim_ascii();
            if payload.is_empty() {
                continue;
            }
            if payload.len() > self.max_frame_bytes {
                return Err(self.reject(payload.len()));
            }
            frames.push(Frame(payload.to_vec()));
        }

        self.check_pending()?;
        Ok(frames)
    }

    /// Number of buffered bytes still waiting for a delimiter.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Discards any buffered partial frame.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    fn check_pending(&mut self) -> Result<(), FrameError> {
        if self.pending.len() > self.max_frame_bytes {
            return Err(self.reject(self.pending.len()));
        }
        Ok(())
    }

    fn reject(&mut self, size: usize) -> FrameError {
        self.pending.clear();
        FrameError::Oversized {
            size,
            max: self.max_frame_bytes,
        }
    }
}
