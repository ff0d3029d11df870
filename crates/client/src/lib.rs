//! Ferry client library
//!
//! Clients for both sides of the distributor, shared by the `emitter` and
//! `analyzer` binaries and the end-to-end tests:
//!
//! - [`EmitterClient`] - streams length-prefixed log frames into the
//!   emitter port through a buffered writer.
//! - [`AnalyzerClient`] - registers on the analyzer port with a weight
//!   handshake, then reads forwarded frames and sends cumulative ACKs and
//!   weight updates.
//! - [`payload`] - the checksummed test payload format
//!   (`id:timestamp:counter:padding+sha256-hex`) and generation helpers.

mod analyzer;
mod emitter;
mod error;
pub mod payload;

pub use analyzer::AnalyzerClient;
pub use emitter::EmitterClient;
pub use error::ClientError;

// Test modules
#[cfg(test)]
mod payload_test;
