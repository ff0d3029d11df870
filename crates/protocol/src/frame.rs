//! Framed log records
//!
//! `Message` is an immutable view of one complete frame exactly as it arrived
//! from an emitter. `FrameDecoder` extracts complete frames from a streaming
//! read buffer without copying: the decoder peeks at the length prefix,
//! validates it, and splits the frame off once all bytes are present.

use bytes::{BufMut, Bytes, BytesMut};

use crate::FrameError;

/// Size of the big-endian `u32` length prefix
pub const LENGTH_PREFIX_LEN: usize = 4;

/// Fixed frame header: length prefix + severity byte
pub const FRAME_HEADER_LEN: usize = 5;

/// Default frame size ceiling (16 MiB)
///
/// The length prefix is attacker-controlled, so the decoder never allocates
/// or waits for more than this many bytes per frame.
pub const DEFAULT_MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// One complete framed log record
///
/// Holds the raw frame bytes, including the 4-byte length prefix and the
/// severity byte, ready to be rewritten verbatim to an analyzer. Cloning is
/// cheap: the underlying buffer is reference-counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    raw: Bytes,
}

impl Message {
    /// Wrap a complete frame
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer is shorter than the fixed header or the
    /// length prefix disagrees with the buffer length.
    pub fn from_frame(raw: Bytes) -> Result<Self, FrameError> {
        if raw.len() < FRAME_HEADER_LEN {
            return Err(FrameError::too_short(raw.len()));
        }
        let declared = u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize;
        if declared != raw.len() {
            return Err(FrameError::too_short(declared.min(raw.len())));
        }
        Ok(Self { raw })
    }

    /// Build a frame from a severity and payload (client side)
    pub fn build(severity: u8, payload: &[u8]) -> Self {
        let total = FRAME_HEADER_LEN + payload.len();
        let mut buf = BytesMut::with_capacity(total);
        buf.put_u32(total as u32);
        buf.put_u8(severity);
        buf.put_slice(payload);
        Self { raw: buf.freeze() }
    }

    /// Total frame length in bytes, including the 4-byte prefix
    #[inline]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// True if the payload is empty (minimum legal frame)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.raw.len() == FRAME_HEADER_LEN
    }

    /// The severity byte, used as the routing priority (0 = highest)
    #[inline]
    pub fn priority(&self) -> u8 {
        self.raw[4]
    }

    /// The full frame, ready to rewrite verbatim
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// The payload bytes after the fixed header
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.raw[FRAME_HEADER_LEN..]
    }

    /// Consume into the underlying buffer
    #[inline]
    pub fn into_bytes(self) -> Bytes {
        self.raw
    }
}

/// Incremental frame decoder
///
/// Call [`FrameDecoder::decode`] after each socket read; it yields complete
/// frames until the buffer holds only a partial one. Decoding is zero-copy:
/// complete frames are split off the accumulation buffer and frozen.
#[derive(Debug, Clone, Copy)]
pub struct FrameDecoder {
    max_frame_len: usize,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_LEN)
    }
}

impl FrameDecoder {
    /// Create a decoder with a frame size ceiling
    pub fn new(max_frame_len: usize) -> Self {
        Self { max_frame_len }
    }

    /// The configured frame size ceiling
    #[inline]
    pub fn max_frame_len(&self) -> usize {
        self.max_frame_len
    }

    /// Extract the next complete frame from `buf`, if one is available
    ///
    /// Returns `Ok(None)` when more bytes are needed. The length prefix is
    /// validated before any bytes are consumed, so a malformed prefix is
    /// reported without disturbing the buffer.
    ///
    /// # Errors
    ///
    /// [`FrameError::TooShort`] if the prefix declares fewer bytes than the
    /// fixed header, [`FrameError::Oversize`] if it exceeds the ceiling.
    pub fn decode(&self, buf: &mut BytesMut) -> Result<Option<Message>, FrameError> {
        if buf.len() < LENGTH_PREFIX_LEN {
            return Ok(None);
        }

        let declared = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
        if declared < FRAME_HEADER_LEN {
            return Err(FrameError::too_short(declared));
        }
        if declared > self.max_frame_len {
            return Err(FrameError::oversize(declared, self.max_frame_len));
        }
        if buf.len() < declared {
            return Ok(None);
        }

        let frame = buf.split_to(declared).freeze();
        Ok(Some(Message { raw: frame }))
    }

    /// Report leftover bytes at EOF
    ///
    /// A non-empty buffer after the peer closed the stream means the last
    /// frame was truncated.
    pub fn finish(&self, buf: &BytesMut) -> Result<(), FrameError> {
        if buf.is_empty() {
            Ok(())
        } else {
            Err(FrameError::UnexpectedEof {
                remaining: buf.len(),
            })
        }
    }
}
