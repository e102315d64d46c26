//! Delimiter-based text framing.
//!
//! A frame is an opaque span of bytes terminated by the 4-byte sequence
//! `CR LF CR LF`. The delimiter may not occur inside frame content; the
//! chunk encoding guarantees this for binary payloads, and [`encode_frame`]
//! rejects any payload that would collide. A stream carries zero or more
//! complete frames followed by at most one partial frame, which is dropped
//! when the stream closes.

use crate::error::ProtocolError;
use bytes::{Buf, Bytes, BytesMut};

/// Frame delimiter: `CR LF CR LF`.
pub const DELIMITER: &[u8; 4] = b"\r\n\r\n";

/// Initial capacity of the per-connection receive buffer.
const INITIAL_BUFFER_CAPACITY: usize = 8192;

/// Encodes a payload as a single frame, appending the delimiter once.
///
/// Fails if the payload itself contains the delimiter, which would
/// desynchronize the stream.
pub fn encode_frame(payload: &[u8]) -> Result<BytesMut, ProtocolError> {
    if payload.windows(DELIMITER.len()).any(|w| w == DELIMITER) {
        return Err(ProtocolError::DelimiterInPayload);
    }

    let mut buf = BytesMut::with_capacity(payload.len() + DELIMITER.len());
    buf.extend_from_slice(payload);
    buf.extend_from_slice(DELIMITER);
    Ok(buf)
}

/// Incremental frame decoder.
///
/// Bytes are appended with [`extend`](FrameCodec::extend) as they arrive
/// from the socket; each call to [`next_frame`](FrameCodec::next_frame)
/// yields one complete frame, so a single read that carried several
/// pipelined frames produces them all, in order.
pub struct FrameCodec {
    buffer: BytesMut,
    /// Bytes of `buffer` already scanned without finding a delimiter.
    scanned: usize,
    /// Optional cap on the buffered partial frame (None = unbounded).
    max_frame_bytes: Option<usize>,
}

impl FrameCodec {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            scanned: 0,
            max_frame_bytes: None,
        }
    }

    /// Caps the number of bytes buffered while waiting for a delimiter.
    ///
    /// The wire contract has no frame size limit; the cap exists to bound
    /// memory held for a peer that never sends the delimiter.
    pub fn with_max_frame_bytes(mut self, max: Option<usize>) -> Self {
        self.max_frame_bytes = max;
        self
    }

    /// Appends received bytes to the internal buffer.
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Attempts to extract the next complete frame from the buffer.
    ///
    /// Returns `Ok(Some(frame))` with the content before the delimiter,
    /// `Ok(None)` if no complete frame is buffered, or an error if the
    /// buffered partial frame exceeds the configured cap.
    pub fn next_frame(&mut self) -> Result<Option<Bytes>, ProtocolError> {
        // Resume scanning where the previous call left off; back up by
        // delimiter-length - 1 in case the delimiter straddles two reads.
        let start = self.scanned.saturating_sub(DELIMITER.len() - 1);

        if let Some(pos) = find_delimiter(&self.buffer[start..]) {
            let frame = self.buffer.split_to(start + pos).freeze();
            self.buffer.advance(DELIMITER.len());
            self.scanned = 0;
            return Ok(Some(frame));
        }

        self.scanned = self.buffer.len();

        if let Some(max) = self.max_frame_bytes {
            if self.buffer.len() > max {
                return Err(ProtocolError::FrameTooLarge {
                    size: self.buffer.len(),
                    max,
                });
            }
        }

        Ok(None)
    }

    /// Returns the number of bytes currently buffered.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn find_delimiter(buf: &[u8]) -> Option<usize> {
    buf.windows(DELIMITER.len()).position(|w| w == DELIMITER)
}
