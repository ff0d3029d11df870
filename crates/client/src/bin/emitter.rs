//! Emitter - log load generator
//!
//! Streams checksummed, framed log records into a distributor at a fixed
//! rate, with log-normally distributed payload sizes and a configurable
//! severity policy. Every knob is reachable as a flag or as the environment
//! variable named alongside it.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ferry_client::payload::{build_payload, sample_payload_size, PriorityMode};
use ferry_client::EmitterClient;

/// Emitter - log load generator for the ferry distributor
#[derive(Parser, Debug)]
#[command(name = "emitter", version, about, long_about = None)]
struct Args {
    /// Distributor emitter address
    #[arg(long, env = "LOG_ADDR", default_value = "localhost:8080")]
    addr: String,

    /// Messages per second
    #[arg(long, env = "EMITTER_RATE", default_value_t = 100)]
    rate: u32,

    /// Stop after this many seconds (0 = run until interrupted)
    #[arg(long, env = "EMITTER_DURATION", default_value_t = 0)]
    duration: u64,

    /// Emitter identity embedded in payloads (default: emitter_<host>_<pid>)
    #[arg(long, env = "EMITTER_ID", default_value = "")]
    id: String,

    /// Log-normal payload size mean (bytes)
    #[arg(long, env = "LOG_SIZE_MEAN", default_value_t = 512.0)]
    size_mean: f64,

    /// Log-normal payload size sigma
    #[arg(long, env = "LOG_SIZE_STDDEV", default_value_t = 0.5)]
    size_stddev: f64,

    /// Minimum payload size (bytes)
    #[arg(long, env = "LOG_MIN_SIZE", default_value_t = 64)]
    min_size: usize,

    /// Maximum payload size (bytes)
    #[arg(long, env = "LOG_MAX_SIZE", default_value_t = 8192)]
    max_size: usize,

    /// Severity policy: single, random, weighted, or cyclic
    #[arg(long, env = "EMITTER_PRIORITY_MODE", default_value = "single")]
    priority_mode: String,

    /// Log each 100th message instead of each 1000th
    #[arg(long, env = "EMITTER_VERBOSE", default_value_t = false, action = clap::ArgAction::Set)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging();

    let mode: PriorityMode = args
        .priority_mode
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let emitter_id = if args.id.is_empty() {
        let host = std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".into());
        format!("emitter_{host}_{}", std::process::id())
    } else {
        args.id.clone()
    };

    tracing::info!(
        emitter = %emitter_id,
        target = %args.addr,
        rate = args.rate,
        size_mean = args.size_mean,
        size_stddev = args.size_stddev,
        min_size = args.min_size,
        max_size = args.max_size,
        mode = %args.priority_mode,
        "emitter starting"
    );

    let mut client = EmitterClient::connect(&args.addr)
        .await
        .context("failed to connect to distributor")?;
    tracing::info!(target = %args.addr, "connected");

    let rate = args.rate.max(1);
    let mut interval = tokio::time::interval(Duration::from_secs(1) / rate);
    let deadline = (args.duration > 0).then(|| Instant::now() + Duration::from_secs(args.duration));

    let mut rng = StdRng::from_entropy();
    let start = Instant::now();
    let mut sent: u64 = 0;
    let mut bytes_sent: u64 = 0;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                tracing::info!("interrupted");
                break;
            }
            _ = interval.tick() => {
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    break;
                }

                let size = sample_payload_size(
                    &mut rng,
                    args.size_mean,
                    args.size_stddev,
                    args.min_size,
                    args.max_size,
                );
                let severity = mode.next(sent, &mut rng);
                let payload = build_payload(&emitter_id, sent, size);

                if let Err(e) = client.send(severity, &payload).await {
                    tracing::error!(error = %e, sent, "send failed");
                    break;
                }

                sent += 1;
                bytes_sent += (payload.len() + 5) as u64;

                if args.verbose && sent % 100 == 0 {
                    tracing::info!(sent, bytes = bytes_sent, "progress");
                } else if sent % 1000 == 0 {
                    tracing::info!(sent, "progress");
                    if let Err(e) = client.flush().await {
                        tracing::error!(error = %e, "flush failed");
                        break;
                    }
                }
            }
        }
    }

    let _ = client.close().await;

    let elapsed = start.elapsed();
    let actual_rate = sent as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
    tracing::info!(
        emitter = %emitter_id,
        sent,
        bytes = bytes_sent,
        duration_secs = format!("{:.2}", elapsed.as_secs_f64()),
        rate = format!("{actual_rate:.2}"),
        "emitter finished"
    );

    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}
