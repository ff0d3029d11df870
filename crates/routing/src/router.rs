//! Weighted router
//!
//! `WeightedRouter` aggregates the routing tree and the membership list and
//! exposes the four membership operations plus the routing hot path.
//!
//! # Publish ordering
//!
//! The tree root and the `total_weight` cell are separately atomic, so a
//! reader can observe one update before the other. The write order bounds the
//! skew to one update:
//!
//! - registration publishes the **root first**, the total second - a reader
//!   never sees a total that includes a node the tree lacks;
//! - unregistration publishes the **total first**, the root second - a reader
//!   never samples against a removed node's weight share.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use ferry_protocol::Message;
use parking_lot::Mutex;
use rand::Rng;

use crate::membership::{MembershipList, Registration};
use crate::metrics::RouterMetrics;
use crate::tree::TreeNode;
use crate::{AnalyzerHandle, AnalyzerId};

/// Routing attempts before a message is dropped
pub const MAX_ROUTE_ATTEMPTS: u32 = 20;

/// Backoff unit: attempt `k` sleeps `k` times this
///
/// Linear, not exponential: under transient congestion the waits stay
/// bounded (all 20 attempts together sleep ~2.1 ms).
const BACKOFF_STEP: Duration = Duration::from_micros(10);

/// A float32 cell stored as its bit pattern in an atomic `u32`
///
/// Release/acquire pairs with the root swap to bound reader skew.
struct AtomicF32 {
    bits: AtomicU32,
}

impl AtomicF32 {
    fn new(value: f32) -> Self {
        Self {
            bits: AtomicU32::new(value.to_bits()),
        }
    }

    #[inline]
    fn load(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Acquire))
    }

    #[inline]
    fn store(&self, value: f32) {
        self.bits.store(value.to_bits(), Ordering::Release);
    }
}

/// Weighted random router over the registered analyzers
///
/// Many-reader, single-writer: `route` only loads atomics; membership
/// changes serialise on the rebuild mutex and publish a freshly built tree.
pub struct WeightedRouter {
    /// Published routing tree, swapped wholesale on every change
    root: ArcSwapOption<TreeNode>,

    /// Published sum of registered weights
    total_weight: AtomicF32,

    /// Rebuild lock + source of truth for tree construction
    members: Mutex<MembershipList>,

    /// Hot-path counters
    metrics: Arc<RouterMetrics>,
}

impl Default for WeightedRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl WeightedRouter {
    /// Create an empty router
    pub fn new() -> Self {
        Self {
            root: ArcSwapOption::const_empty(),
            total_weight: AtomicF32::new(0.0),
            members: Mutex::new(MembershipList::new()),
            metrics: Arc::new(RouterMetrics::new()),
        }
    }

    /// Shared handle to the router's metrics
    pub fn metrics(&self) -> Arc<RouterMetrics> {
        Arc::clone(&self.metrics)
    }

    /// The currently published weight total
    #[inline]
    pub fn total_weight(&self) -> f32 {
        self.total_weight.load()
    }

    /// Number of registered analyzers
    pub fn analyzer_count(&self) -> usize {
        self.members.lock().len()
    }

    /// Make an analyzer eligible for routing
    pub fn register(&self, handle: AnalyzerHandle, weight: f32) {
        let id = handle.id().clone();
        let mut members = self.members.lock();
        members.insert(Registration { handle, weight });

        let root = TreeNode::build(&members).map(Arc::from);
        let total = members.total_weight();

        // Root first, total second.
        self.root.store(root);
        self.total_weight.store(total);

        self.metrics.record_registered();
        tracing::info!(
            analyzer = %id,
            weight,
            total_weight = total,
            analyzers = members.len(),
            "analyzer registered"
        );
    }

    /// Remove an analyzer from routing
    ///
    /// Messages already sitting on its priority queues are the caller's
    /// responsibility (the session drains and re-routes them on teardown).
    /// Returns false if the id was not registered.
    pub fn unregister(&self, id: &AnalyzerId) -> bool {
        let mut members = self.members.lock();
        if members.remove(id).is_none() {
            return false;
        }

        let root = TreeNode::build(&members).map(Arc::from);
        let total = members.total_weight();

        // Total first, root second.
        self.total_weight.store(total);
        self.root.store(root);

        self.metrics.record_unregistered();
        tracing::info!(
            analyzer = %id,
            total_weight = total,
            analyzers = members.len(),
            "analyzer unregistered"
        );
        true
    }

    /// Change an analyzer's weight
    ///
    /// Performed as remove + re-insert under a single hold of the rebuild
    /// mutex. Both steps publish, so concurrent readers may observe the
    /// brief window where the analyzer is absent. Returns false if the id
    /// was not registered.
    pub fn update_weight(&self, id: &AnalyzerId, weight: f32) -> bool {
        let mut members = self.members.lock();
        let Some(mut reg) = members.remove(id) else {
            return false;
        };
        let old_weight = reg.weight;

        self.total_weight.store(members.total_weight());
        self.root.store(TreeNode::build(&members).map(Arc::from));

        reg.weight = weight;
        members.insert(reg);

        self.root.store(TreeNode::build(&members).map(Arc::from));
        self.total_weight.store(members.total_weight());

        self.metrics.record_weight_update();
        tracing::info!(
            analyzer = %id,
            old_weight,
            new_weight = weight,
            "analyzer weight updated"
        );
        true
    }

    /// Deliver a message to exactly one analyzer's priority queue
    ///
    /// Per attempt: load the root, draw a uniform point in weight space,
    /// walk the tree, and try a non-blocking enqueue on the sampled node. A
    /// full queue fails the whole attempt - the walk never falls through to
    /// a different node, which would skew delivery away from the configured
    /// weights under overload.
    ///
    /// Returns true once enqueued; false after dropping the message.
    pub async fn route(&self, msg: Message) -> bool {
        let mut msg = msg;

        for attempt in 1..=MAX_ROUTE_ATTEMPTS {
            if let Some(root) = self.root.load_full() {
                let r = self.total_weight.load() * rand::thread_rng().gen::<f32>();
                if let Some(handle) = root.sample(r) {
                    match handle.try_enqueue(msg) {
                        Ok(()) => {
                            self.metrics.record_routed();
                            return true;
                        }
                        Err(rejected) => msg = rejected,
                    }
                }
            }

            self.metrics.record_retry();
            tokio::time::sleep(BACKOFF_STEP * attempt).await;
        }

        self.metrics.record_dropped();
        tracing::warn!(
            attempts = MAX_ROUTE_ATTEMPTS,
            priority = msg.priority(),
            bytes = msg.len(),
            "message dropped: all routing attempts failed"
        );
        false
    }
}

impl std::fmt::Debug for WeightedRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeightedRouter")
            .field("analyzers", &self.analyzer_count())
            .field("total_weight", &self.total_weight())
            .finish()
    }
}
