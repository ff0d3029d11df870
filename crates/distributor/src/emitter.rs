//! Emitter server and sessions
//!
//! Each accepted emitter socket runs a single inbound reader: accumulate
//! bytes, extract complete frames, hand each one to the router. The emitter
//! direction has no acknowledgements and no backchannel; the session never
//! writes. Backpressure reaches the emitter naturally - while `route` backs
//! off, this reader is not consuming the socket.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::BytesMut;
use ferry_protocol::FrameDecoder;
use ferry_routing::WeightedRouter;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

use crate::config::EmitterServerConfig;
use crate::error::DistributorError;
use crate::metrics::EmitterMetrics;
use crate::socket::{configure_stream, SocketOptions};

/// TCP server accepting emitter connections
pub struct EmitterServer {
    config: EmitterServerConfig,
    router: Arc<WeightedRouter>,
    metrics: Arc<EmitterMetrics>,
}

impl EmitterServer {
    /// Create a new emitter server feeding the given router
    pub fn new(config: EmitterServerConfig, router: Arc<WeightedRouter>) -> Self {
        Self {
            config,
            router,
            metrics: Arc::new(EmitterMetrics::new()),
        }
    }

    /// Shared handle to the server's metrics
    ///
    /// Remains valid after `run()` consumes the server.
    pub fn metrics(&self) -> Arc<EmitterMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Bind and accept emitter connections until cancelled
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
            max_frame_len = self.config.max_frame_len,
            "emitter server listening"
        );

        let opts = SocketOptions {
            keepalive: self.config.keepalive,
            keepalive_period: self.config.keepalive_period,
            nodelay: false,
        };
        let server = Arc::new(self);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                result = listener.accept() => {
                    match result {
                        Ok((stream, peer)) => {
                            configure_stream(&stream, &opts);
                            server.metrics.connection_opened();

                            let server = Arc::clone(&server);
                            let cancel = cancel.clone();
                            tokio::spawn(async move {
                                server.handle_connection(stream, peer, cancel).await;
                                server.metrics.connection_closed();
                            });
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "emitter accept error");
                        }
                    }
                }
            }
        }

        tracing::info!("emitter server stopped");
        Ok(())
    }

    /// Read frames from one emitter until EOF, error, or shutdown
    async fn handle_connection(
        &self,
        mut stream: TcpStream,
        peer: SocketAddr,
        cancel: CancellationToken,
    ) {
        let emitter = format!("emitter_{peer}");
        tracing::debug!(emitter = %emitter, "emitter connected");

        let decoder = FrameDecoder::new(self.config.max_frame_len);
        let mut buf = BytesMut::with_capacity(self.config.read_buffer_size);

        loop {
            let read = tokio::select! {
                _ = cancel.cancelled() => break,
                result = stream.read_buf(&mut buf) => result,
            };

            match read {
                Ok(0) => {
                    // EOF; a non-empty buffer means the last frame was cut off
                    if let Err(e) = decoder.finish(&buf) {
                        tracing::warn!(emitter = %emitter, error = %e, "emitter closed mid-frame");
                        self.metrics.record_protocol_error();
                    } else {
                        tracing::debug!(emitter = %emitter, "emitter disconnected");
                    }
                    break;
                }
                Ok(_) => loop {
                    match decoder.decode(&mut buf) {
                        Ok(Some(msg)) => {
                            self.metrics.record_frame(msg.len() as u64);
                            self.router.route(msg).await;
                        }
                        Ok(None) => break,
                        Err(e) => {
                            tracing::warn!(
                                emitter = %emitter,
                                error = %e,
                                "protocol error, closing connection"
                            );
                            self.metrics.record_protocol_error();
                            return;
                        }
                    }
                },
                Err(e) => {
                    tracing::debug!(emitter = %emitter, error = %e, "emitter read error");
                    break;
                }
            }
        }
    }
}
