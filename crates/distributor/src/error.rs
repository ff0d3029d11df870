//! Distributor error types

use thiserror::Error;

/// Errors from the distributor's TCP servers
#[derive(Debug, Error)]
pub enum DistributorError {
    /// Failed to bind a listener
    #[error("failed to bind to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
