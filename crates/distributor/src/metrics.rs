//! Per-server metrics
//!
//! Atomic counters with point-in-time snapshots, shared between the servers
//! and the diagnostics endpoint.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for the emitter-facing server
#[derive(Debug, Default)]
pub struct EmitterMetrics {
    /// Currently connected emitters
    pub connections_active: AtomicU64,

    /// Total emitter connections accepted
    pub connections_total: AtomicU64,

    /// Complete frames handed to the router
    pub frames_received: AtomicU64,

    /// Frame bytes received (including prefixes)
    pub bytes_received: AtomicU64,

    /// Connections closed for malformed or truncated frames
    pub protocol_errors: AtomicU64,
}

impl EmitterMetrics {
    /// Create a new metrics instance
    pub const fn new() -> Self {
        Self {
            connections_active: AtomicU64::new(0),
            connections_total: AtomicU64::new(0),
            frames_received: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            protocol_errors: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn connection_opened(&self) {
        self.connections_active.fetch_add(1, Ordering::Relaxed);
        self.connections_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn connection_closed(&self) {
        self.connections_active.fetch_sub(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_frame(&self, bytes: u64) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(bytes, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_protocol_error(&self) {
        self.protocol_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a point-in-time snapshot
    pub fn snapshot(&self) -> EmitterMetricsSnapshot {
        EmitterMetricsSnapshot {
            connections_active: self.connections_active.load(Ordering::Relaxed),
            connections_total: self.connections_total.load(Ordering::Relaxed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            protocol_errors: self.protocol_errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of emitter server metrics
#[derive(Debug, Clone, Copy, Default)]
pub struct EmitterMetricsSnapshot {
    pub connections_active: u64,
    pub connections_total: u64,
    pub frames_received: u64,
    pub bytes_received: u64,
    pub protocol_errors: u64,
}

/// Counters for the analyzer-facing server
#[derive(Debug, Default)]
pub struct AnalyzerMetrics {
    /// Currently registered sessions
    pub sessions_active: AtomicU64,

    /// Total sessions that completed registration
    pub sessions_total: AtomicU64,

    /// Connections closed before registration (bad or missing weight frame)
    pub registrations_rejected: AtomicU64,

    /// Frames written to analyzer sockets
    pub frames_written: AtomicU64,

    /// Frame bytes written
    pub bytes_written: AtomicU64,

    /// Messages confirmed by cumulative ACKs
    pub messages_acked: AtomicU64,

    /// Sessions failed by ACK timeout
    pub ack_timeouts: AtomicU64,

    /// Messages re-routed by the failure path (pending + queued)
    pub messages_rerouted: AtomicU64,
}

impl AnalyzerMetrics {
    /// Create a new metrics instance
    pub const fn new() -> Self {
        Self {
            sessions_active: AtomicU64::new(0),
            sessions_total: AtomicU64::new(0),
            registrations_rejected: AtomicU64::new(0),
            frames_written: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            messages_acked: AtomicU64::new(0),
            ack_timeouts: AtomicU64::new(0),
            messages_rerouted: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn session_opened(&self) {
        self.sessions_active.fetch_add(1, Ordering::Relaxed);
        self.sessions_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn session_closed(&self) {
        self.sessions_active.fetch_sub(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_rejected(&self) {
        self.registrations_rejected.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_written(&self, bytes: u64) {
        self.frames_written.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_acked(&self, count: u64) {
        self.messages_acked.fetch_add(count, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_timeout(&self) {
        self.ack_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_rerouted(&self, count: u64) {
        self.messages_rerouted.fetch_add(count, Ordering::Relaxed);
    }

    /// Get a point-in-time snapshot
    pub fn snapshot(&self) -> AnalyzerMetricsSnapshot {
        AnalyzerMetricsSnapshot {
            sessions_active: self.sessions_active.load(Ordering::Relaxed),
            sessions_total: self.sessions_total.load(Ordering::Relaxed),
            registrations_rejected: self.registrations_rejected.load(Ordering::Relaxed),
            frames_written: self.frames_written.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            messages_acked: self.messages_acked.load(Ordering::Relaxed),
            ack_timeouts: self.ack_timeouts.load(Ordering::Relaxed),
            messages_rerouted: self.messages_rerouted.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of analyzer server metrics
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyzerMetricsSnapshot {
    pub sessions_active: u64,
    pub sessions_total: u64,
    pub registrations_rejected: u64,
    pub frames_written: u64,
    pub bytes_written: u64,
    pub messages_acked: u64,
    pub ack_timeouts: u64,
    pub messages_rerouted: u64,
}
