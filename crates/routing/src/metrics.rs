//! Router metrics
//!
//! Atomic counters for the routing hot path, snapshotted for reporting.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters maintained by the weighted router
#[derive(Debug, Default)]
pub struct RouterMetrics {
    /// Messages delivered to some analyzer's priority queue
    pub messages_routed: AtomicU64,

    /// Messages dropped after exhausting all routing attempts
    pub messages_dropped: AtomicU64,

    /// Failed routing attempts (empty registry, full queue, or dead walk)
    pub route_retries: AtomicU64,

    /// Analyzer registrations
    pub registrations: AtomicU64,

    /// Analyzer unregistrations
    pub unregistrations: AtomicU64,

    /// Weight updates applied
    pub weight_updates: AtomicU64,
}

impl RouterMetrics {
    /// Create a new metrics instance
    pub const fn new() -> Self {
        Self {
            messages_routed: AtomicU64::new(0),
            messages_dropped: AtomicU64::new(0),
            route_retries: AtomicU64::new(0),
            registrations: AtomicU64::new(0),
            unregistrations: AtomicU64::new(0),
            weight_updates: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_routed(&self) {
        self.messages_routed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_dropped(&self) {
        self.messages_dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_retry(&self) {
        self.route_retries.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_registered(&self) {
        self.registrations.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_unregistered(&self) {
        self.unregistrations.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_weight_update(&self) {
        self.weight_updates.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a point-in-time snapshot
    pub fn snapshot(&self) -> RouterSnapshot {
        RouterSnapshot {
            messages_routed: self.messages_routed.load(Ordering::Relaxed),
            messages_dropped: self.messages_dropped.load(Ordering::Relaxed),
            route_retries: self.route_retries.load(Ordering::Relaxed),
            registrations: self.registrations.load(Ordering::Relaxed),
            unregistrations: self.unregistrations.load(Ordering::Relaxed),
            weight_updates: self.weight_updates.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of router metrics
#[derive(Debug, Clone, Copy, Default)]
pub struct RouterSnapshot {
    pub messages_routed: u64,
    pub messages_dropped: u64,
    pub route_retries: u64,
    pub registrations: u64,
    pub unregistrations: u64,
    pub weight_updates: u64,
}
