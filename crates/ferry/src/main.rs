//! Ferry - TCP log distribution hub
//!
//! Accepts log-producing emitters on one port and log-consuming analyzers on
//! another, forwarding each message to exactly one analyzer chosen by a
//! weighted random policy.
//!
//! # Usage
//!
//! ```bash
//! # Defaults: emitters on 8080, analyzers on 8081
//! ferry
//!
//! # Custom ports and a diagnostics endpoint
//! ferry --emitter-port 9080 --analyzer-port 9081 --diag-port 6060
//! ```

mod diag;
mod serve;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Ferry - TCP log distribution hub with weighted delivery
#[derive(Parser, Debug)]
#[command(name = "ferry", version, about, long_about = None)]
struct Cli {
    /// Bind address for both listeners
    #[arg(long, default_value = "0.0.0.0")]
    address: String,

    /// Port accepting emitter (log producer) connections
    #[arg(long, default_value_t = 8080)]
    emitter_port: u16,

    /// Port accepting analyzer (log consumer) connections
    #[arg(long, default_value_t = 8081)]
    analyzer_port: u16,

    /// Seconds the oldest unacknowledged message may wait before its
    /// analyzer session is declared dead
    #[arg(long, default_value_t = 30)]
    ack_timeout: u64,

    /// Diagnostics HTTP port exposing /healthz and /metrics (0 = disabled)
    #[arg(long, env = "DISTRIBUTOR_PPROF_PORT", default_value_t = 0)]
    diag_port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    serve::run(cli).await
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .init();

    Ok(())
}
