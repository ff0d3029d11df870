//! Ferry routing core
//!
//! Holds the set of registered analyzers and picks exactly one per message by
//! weighted random sampling.
//!
//! # Design
//!
//! - **Lock-free reads**: the routing tree is immutable once published. The
//!   root lives behind an [`arc_swap::ArcSwapOption`] and is replaced
//!   wholesale on every membership or weight change, so `route` never takes a
//!   lock.
//! - **Weight-balanced tree**: `sample(r)` walks from the root in O(log n),
//!   giving each analyzer a selection probability of `weight / total_weight`.
//! - **Single-writer rebuilds**: registration, unregistration, and weight
//!   updates serialise on a rebuild mutex, rebuild the tree from the ordered
//!   membership list, and publish with a defined ordering between the root
//!   swap and the `total_weight` cell.
//! - **Non-blocking delivery**: enqueueing into an analyzer's priority queue
//!   uses `try_send`; a full queue fails the whole routing attempt and the
//!   router backs off and redraws.

mod analyzer_id;
mod handle;
mod membership;
mod metrics;
mod router;
mod tree;

pub use analyzer_id::AnalyzerId;
pub use handle::{AnalyzerHandle, PRIORITY_LEVELS};
pub use metrics::{RouterMetrics, RouterSnapshot};
pub use router::{WeightedRouter, MAX_ROUTE_ATTEMPTS};

// Test modules
#[cfg(test)]
mod router_test;
#[cfg(test)]
mod tree_test;
