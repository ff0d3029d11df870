//! Protocol error types

use thiserror::Error;

/// Errors that can occur while decoding the framed wire protocol
#[derive(Debug, Error)]
pub enum FrameError {
    /// The length prefix claims fewer bytes than the fixed header
    #[error("frame too short: declared {declared} bytes, minimum is {minimum}")]
    TooShort { declared: usize, minimum: usize },

    /// The length prefix exceeds the configured ceiling
    #[error("frame size {declared} exceeds limit {limit}")]
    Oversize { declared: usize, limit: usize },

    /// The peer closed the connection mid-frame
    #[error("unexpected EOF: {remaining} bytes of partial frame left unread")]
    UnexpectedEof { remaining: usize },

    /// I/O error from the underlying socket
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FrameError {
    /// Create a too-short error for a declared total length
    #[inline]
    pub fn too_short(declared: usize) -> Self {
        Self::TooShort {
            declared,
            minimum: crate::FRAME_HEADER_LEN,
        }
    }

    /// Create an oversize error
    #[inline]
    pub fn oversize(declared: usize, limit: usize) -> Self {
        Self::Oversize { declared, limit }
    }

    /// True if the error indicates a malformed frame rather than a transport
    /// failure (the connection is closed either way, but malformed frames are
    /// counted separately)
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, Self::TooShort { .. } | Self::Oversize { .. })
    }
}
