//! Ferry distributor
//!
//! The delivery engine of the log distribution hub: two TCP acceptors and the
//! per-connection sessions between them.
//!
//! # Data flow
//!
//! ```text
//! emitter socket → EmitterSession (frame decode) → WeightedRouter.route
//!     → one AnalyzerSession's priority queue → writer (strict priority,
//!       sequence-numbered, buffered) → analyzer socket
//! analyzer socket → control reader → cumulative ACKs / weight updates
//! ```
//!
//! # Failure semantics
//!
//! An analyzer session fails on write error, control-channel error/EOF, or
//! ACK timeout. The failure path is idempotent: unregister from the router
//! first (no new messages arrive), cancel the session, then re-route every
//! unacknowledged pending message and everything still sitting in the
//! priority queues. Rerouted messages keep their original priority because
//! the whole raw frame is re-routed.

mod analyzer;
mod config;
mod emitter;
mod error;
mod metrics;
mod pending;
mod socket;

pub use analyzer::AnalyzerServer;
pub use config::{AnalyzerServerConfig, EmitterServerConfig};
pub use emitter::EmitterServer;
pub use error::DistributorError;
pub use metrics::{
    AnalyzerMetrics, AnalyzerMetricsSnapshot, EmitterMetrics, EmitterMetricsSnapshot,
};

#[cfg(test)]
mod pending_test;
