//! TCP socket tuning
//!
//! Options not exposed by `tokio::net::TcpStream` are set through
//! `socket2::SockRef`. Failures are logged and ignored: keepalive and nodelay
//! are performance knobs, not correctness requirements.

use std::time::Duration;

use socket2::{SockRef, TcpKeepalive};
use tokio::net::TcpStream;

/// Per-connection socket options
#[derive(Debug, Clone, Copy)]
pub(crate) struct SocketOptions {
    pub(crate) keepalive: bool,
    pub(crate) keepalive_period: Duration,
    pub(crate) nodelay: bool,
}

/// Apply socket options to an accepted connection
pub(crate) fn configure_stream(stream: &TcpStream, opts: &SocketOptions) {
    if opts.nodelay {
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(error = %e, "failed to set TCP_NODELAY");
        }
    }

    if opts.keepalive {
        let sock = SockRef::from(stream);
        let keepalive = TcpKeepalive::new().with_time(opts.keepalive_period);

        // On Linux, also probe at the same period once keepalive kicks in
        #[cfg(target_os = "linux")]
        let keepalive = keepalive.with_interval(opts.keepalive_period);

        if let Err(e) = sock.set_tcp_keepalive(&keepalive) {
            tracing::debug!(error = %e, "failed to set TCP keepalive");
        }
    }
}
