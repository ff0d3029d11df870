//! Server configuration

use std::time::Duration;

use ferry_protocol::DEFAULT_MAX_FRAME_LEN;

/// Default emitter-facing port
pub const DEFAULT_EMITTER_PORT: u16 = 8080;

/// Default analyzer-facing port
pub const DEFAULT_ANALYZER_PORT: u16 = 8081;

/// Default ACK timeout (reference deployments range from 30 s to 2 min)
pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_secs(30);

/// Default capacity of each of the 256 per-analyzer priority queues
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// Emitter server configuration
#[derive(Debug, Clone)]
pub struct EmitterServerConfig {
    /// Bind address (e.g. "0.0.0.0")
    pub address: String,

    /// Listen port
    pub port: u16,

    /// Frame size ceiling; larger length prefixes close the connection
    pub max_frame_len: usize,

    /// Initial per-connection read buffer size
    pub read_buffer_size: usize,

    /// TCP keepalive enabled
    pub keepalive: bool,

    /// TCP keepalive period
    pub keepalive_period: Duration,
}

impl Default for EmitterServerConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".into(),
            port: DEFAULT_EMITTER_PORT,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            read_buffer_size: 64 * 1024,
            keepalive: true,
            keepalive_period: Duration::from_secs(30),
        }
    }
}

impl EmitterServerConfig {
    /// Create config with a custom port
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    /// Get the socket address to bind to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

/// Analyzer server configuration
#[derive(Debug, Clone)]
pub struct AnalyzerServerConfig {
    /// Bind address (e.g. "0.0.0.0")
    pub address: String,

    /// Listen port
    pub port: u16,

    /// Session failure threshold: if the oldest pending message has been
    /// unacknowledged this long, the session is declared dead
    pub ack_timeout: Duration,

    /// Capacity of each of the 256 priority queues
    pub queue_capacity: usize,

    /// Idle flush: buffered outbound bytes are flushed after this long
    /// without a new message
    pub flush_interval: Duration,

    /// Writer wait when all priority queues are empty
    pub idle_wait: Duration,

    /// TCP keepalive enabled
    pub keepalive: bool,

    /// TCP keepalive period
    pub keepalive_period: Duration,

    /// TCP_NODELAY on analyzer sockets (the writer batches already)
    pub nodelay: bool,
}

impl Default for AnalyzerServerConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".into(),
            port: DEFAULT_ANALYZER_PORT,
            ack_timeout: DEFAULT_ACK_TIMEOUT,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            flush_interval: Duration::from_millis(10),
            idle_wait: Duration::from_millis(1),
            keepalive: true,
            keepalive_period: Duration::from_secs(30),
            nodelay: true,
        }
    }
}

impl AnalyzerServerConfig {
    /// Create config with a custom port
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    /// Get the socket address to bind to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}
