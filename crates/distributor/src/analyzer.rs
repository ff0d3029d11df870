//! Analyzer server and sessions
//!
//! Each accepted analyzer socket runs one session. Registration happens when
//! the first 4 bytes arrive: they must decode as a weight control word
//! (MSB clear, finite value) or the socket is closed without registering.
//!
//! A registered session drives three loops until the session token fires:
//!
//! - **writer** - drains the 256 priority queues in strict numeric order,
//!   appends each message to the pending list before the socket write
//!   completes, and flushes the buffered writer after 10 ms without a new
//!   message;
//! - **control reader** - 4-byte control words: cumulative ACKs pop the
//!   pending list head-first, weight updates go through the router;
//! - **timeout checker** - every `ack_timeout / 2`, fails the session if the
//!   oldest pending message has waited longer than `ack_timeout`.
//!
//! The teardown path is gated by a CAS on the `connected` flag, so the first
//! failure wins and later invocations return immediately.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use ferry_protocol::{ControlWord, Message, CONTROL_WORD_LEN};
use ferry_routing::{AnalyzerHandle, AnalyzerId, WeightedRouter};
use parking_lot::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::AnalyzerServerConfig;
use crate::error::DistributorError;
use crate::metrics::AnalyzerMetrics;
use crate::pending::PendingList;
use crate::socket::{configure_stream, SocketOptions};

/// TCP server accepting analyzer connections
pub struct AnalyzerServer {
    config: AnalyzerServerConfig,
    router: Arc<WeightedRouter>,
    metrics: Arc<AnalyzerMetrics>,
}

impl AnalyzerServer {
    /// Create a new analyzer server feeding the given router
    pub fn new(config: AnalyzerServerConfig, router: Arc<WeightedRouter>) -> Self {
        Self {
            config,
            router,
            metrics: Arc::new(AnalyzerMetrics::new()),
        }
    }

    /// Shared handle to the server's metrics
    ///
    /// Remains valid after `run()` consumes the server.
    pub fn metrics(&self) -> Arc<AnalyzerMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Bind and accept analyzer connections until cancelled
    pub async fn run(self, cancel: CancellationToken) -> Result<(), DistributorError> {
        let bind_addr = self.config.bind_address();
        let listener =
            TcpListener::bind(&bind_addr)
                .await
                .map_err(|e| DistributorError::Bind {
                    address: bind_addr.clone(),
                    source: e,
                })?;

        tracing::info!(
            address = %bind_addr,
            ack_timeout = ?self.config.ack_timeout,
            queue_capacity = self.config.queue_capacity,
            "analyzer server listening"
        );

        let opts = SocketOptions {
            keepalive: self.config.keepalive,
            keepalive_period: self.config.keepalive_period,
            nodelay: self.config.nodelay,
        };

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                result = listener.accept() => {
                    match result {
                        Ok((stream, peer)) => {
                            configure_stream(&stream, &opts);
                            let router = Arc::clone(&self.router);
                            let metrics = Arc::clone(&self.metrics);
                            let config = self.config.clone();
                            let cancel = cancel.clone();
                            tokio::spawn(async move {
                                AnalyzerSession::run(stream, peer, router, config, metrics, cancel)
                                    .await;
                            });
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "analyzer accept error");
                        }
                    }
                }
            }
        }

        tracing::info!("analyzer server stopped");
        Ok(())
    }
}

/// Per-connection analyzer state
struct AnalyzerSession {
    id: AnalyzerId,
    router: Arc<WeightedRouter>,

    /// Messages written but not yet cumulatively acknowledged
    pending: Mutex<PendingList>,

    /// CAS gate for the teardown path
    connected: AtomicBool,

    /// Session-local token, child of the server token
    cancel: CancellationToken,

    config: AnalyzerServerConfig,
    metrics: Arc<AnalyzerMetrics>,
}

impl AnalyzerSession {
    /// Handle one analyzer connection from handshake to teardown
    async fn run(
        mut stream: TcpStream,
        peer: SocketAddr,
        router: Arc<WeightedRouter>,
        config: AnalyzerServerConfig,
        metrics: Arc<AnalyzerMetrics>,
        server_cancel: CancellationToken,
    ) {
        let id = AnalyzerId::from_peer(peer);
        tracing::debug!(analyzer = %id, "analyzer connected");

        // The first 4 bytes on a fresh socket are the registration weight.
        let mut word = [0u8; CONTROL_WORD_LEN];
        if let Err(e) = stream.read_exact(&mut word).await {
            tracing::warn!(analyzer = %id, error = %e, "failed to read initial weight frame");
            metrics.record_rejected();
            return;
        }

        let weight = match ControlWord::decode(word) {
            ControlWord::Weight(w) if w.is_finite() => w,
            ControlWord::Weight(w) => {
                tracing::warn!(analyzer = %id, weight = w, "rejecting non-finite initial weight");
                metrics.record_rejected();
                return;
            }
            ControlWord::Ack(_) => {
                tracing::warn!(
                    analyzer = %id,
                    "initial control word has the ACK bit set, closing unregistered"
                );
                metrics.record_rejected();
                return;
            }
        };

        let (handle, receivers) = AnalyzerHandle::channel(id.clone(), config.queue_capacity);
        let session = Arc::new(Self {
            id,
            router,
            pending: Mutex::new(PendingList::new()),
            connected: AtomicBool::new(true),
            cancel: server_cancel.child_token(),
            config,
            metrics,
        });

        session.router.register(handle, weight);
        session.metrics.session_opened();

        let (read_half, write_half) = stream.into_split();
        tokio::join!(
            session.write_loop(write_half, receivers),
            session.control_loop(read_half),
            session.timeout_loop(),
        );

        session.metrics.session_closed();
        tracing::info!(analyzer = %session.id, "analyzer disconnected");
    }

    /// Outbound writer: strict-priority dequeue, sequence assignment, writes
    async fn write_loop(
        &self,
        write_half: OwnedWriteHalf,
        mut receivers: Vec<mpsc::Receiver<Message>>,
    ) {
        let mut writer = BufWriter::new(write_half);
        let mut last_activity = Instant::now();

        while !self.cancel.is_cancelled() {
            match next_by_priority(&mut receivers) {
                Some(msg) => {
                    // The pending append must land before the write
                    // completes, so an ACK racing this message always finds
                    // it in the list.
                    self.pending.lock().push(msg.clone());

                    if let Err(e) = writer.write_all(msg.as_bytes()).await {
                        tracing::warn!(analyzer = %self.id, error = %e, "write to analyzer failed");
                        break;
                    }
                    self.metrics.record_written(msg.len() as u64);
                    last_activity = Instant::now();
                }
                None => {
                    if !writer.buffer().is_empty()
                        && last_activity.elapsed() >= self.config.flush_interval
                    {
                        if let Err(e) = writer.flush().await {
                            tracing::warn!(analyzer = %self.id, error = %e, "flush to analyzer failed");
                            break;
                        }
                    }
                    tokio::select! {
                        _ = self.cancel.cancelled() => {}
                        _ = tokio::time::sleep(self.config.idle_wait) => {}
                    }
                }
            }
        }

        // Covers write failure and cooperative shutdown alike; no-op if the
        // control reader or timeout checker tore the session down first.
        self.teardown("writer stopped").await;

        // Unregistration has happened, so nothing new lands in the queues
        // while they drain. Everything the writer never pulled goes back
        // through the router, then one final sweep of the pending list
        // catches a push that raced the teardown drain (this loop is the
        // only producer, and it has stopped).
        let mut rerouted = 0usize;
        for rx in receivers.iter_mut() {
            while let Ok(msg) = rx.try_recv() {
                self.router.route(msg).await;
                rerouted += 1;
            }
        }
        let stragglers = { self.pending.lock().drain() };
        rerouted += stragglers.len();
        for msg in stragglers {
            self.router.route(msg).await;
        }

        if rerouted > 0 {
            self.metrics.record_rerouted(rerouted as u64);
            tracing::info!(analyzer = %self.id, count = rerouted, "rerouted queued messages");
        }
    }

    /// Inbound control reader: cumulative ACKs and weight updates
    async fn control_loop(&self, mut read_half: OwnedReadHalf) {
        let mut word = [0u8; CONTROL_WORD_LEN];

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                result = read_half.read_exact(&mut word) => {
                    match result {
                        Ok(_) => self.handle_control_word(ControlWord::decode(word)),
                        Err(e) => {
                            if e.kind() != std::io::ErrorKind::UnexpectedEof {
                                tracing::warn!(analyzer = %self.id, error = %e, "control read failed");
                            }
                            self.teardown("control channel closed").await;
                            break;
                        }
                    }
                }
            }
        }
    }

    fn handle_control_word(&self, word: ControlWord) {
        match word {
            ControlWord::Ack(seq) => {
                let (released, outstanding) = {
                    let mut pending = self.pending.lock();
                    (pending.ack(seq), pending.len())
                };
                self.metrics.record_acked(released as u64);
                tracing::trace!(analyzer = %self.id, seq, released, outstanding, "cumulative ack");
            }
            ControlWord::Weight(w) if w.is_finite() => {
                self.router.update_weight(&self.id, w);
            }
            ControlWord::Weight(w) => {
                tracing::warn!(analyzer = %self.id, weight = w, "ignoring non-finite weight update");
            }
        }
    }

    /// Fail the session when the oldest pending message outlives the timeout
    ///
    /// No probing, no second chances: an analyzer that stops acknowledging
    /// is either unreachable or fatally slow, and its pending work is
    /// redirected.
    async fn timeout_loop(&self) {
        let period = self.config.ack_timeout / 2;
        let mut ticker =
            tokio::time::interval_at(tokio::time::Instant::now() + period, period);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if !self.connected.load(Ordering::Acquire) {
                        break;
                    }
                    let expired = self
                        .pending
                        .lock()
                        .oldest_sent_at()
                        .is_some_and(|sent| sent.elapsed() > self.config.ack_timeout);
                    if expired {
                        tracing::warn!(
                            analyzer = %self.id,
                            timeout = ?self.config.ack_timeout,
                            "ack timeout"
                        );
                        self.metrics.record_timeout();
                        self.teardown("ack timeout").await;
                        break;
                    }
                }
            }
        }
    }

    /// Idempotent failure/shutdown path
    ///
    /// Order matters: unregister so the router stops feeding this session,
    /// wake every loop, and only then give the unacknowledged messages their
    /// second chance through the router.
    async fn teardown(&self, reason: &str) {
        if self
            .connected
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        tracing::info!(analyzer = %self.id, reason, "analyzer session closing");
        self.router.unregister(&self.id);
        self.cancel.cancel();

        let pending = { self.pending.lock().drain() };
        if pending.is_empty() {
            return;
        }

        let count = pending.len();
        for msg in pending {
            self.router.route(msg).await;
        }
        self.metrics.record_rerouted(count as u64);
        tracing::info!(analyzer = %self.id, count, "rerouted unacknowledged messages");
    }
}

/// Take one message from the highest-priority non-empty queue
///
/// Scans index 0 upward and returns on the first hit, so every call restarts
/// from the top: a priority-0 arrival overtakes anything lower-priority that
/// is still queued.
pub(crate) fn next_by_priority(receivers: &mut [mpsc::Receiver<Message>]) -> Option<Message> {
    for rx in receivers.iter_mut() {
        if let Ok(msg) = rx.try_recv() {
            return Some(msg);
        }
    }
    None
}
