//! Client error types

use ferry_protocol::FrameError;
use thiserror::Error;

/// Errors from the emitter and analyzer clients
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection to the distributor failed
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O error on an established connection
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed frame from the distributor
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),
}
