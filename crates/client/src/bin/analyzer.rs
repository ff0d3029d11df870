//! Analyzer - log consumer
//!
//! Registers with a distributor at a configurable weight, consumes forwarded
//! frames, validates payload checksums, and acknowledges cumulatively every N
//! messages. Optionally re-negotiates its weight as it runs.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use ferry_protocol::SEQ_MASK;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ferry_client::payload::validate_payload;
use ferry_client::AnalyzerClient;

/// Analyzer - weighted log consumer for the ferry distributor
#[derive(Parser, Debug)]
#[command(name = "analyzer", version, about, long_about = None)]
struct Args {
    /// Distributor analyzer address
    #[arg(long, env = "DISTRIBUTOR_ADDR", default_value = "localhost:8081")]
    addr: String,

    /// Relative traffic weight to register with
    #[arg(long, env = "ANALYZER_WEIGHT", default_value_t = 0.25)]
    weight: f32,

    /// Analyzer identity for logging (default: analyzer_<host>_<pid>)
    #[arg(long, env = "ANALYZER_ID", default_value = "")]
    id: String,

    /// Send a cumulative ACK every N messages
    #[arg(long, env = "ANALYZER_ACK_EVERY", default_value_t = 10)]
    ack_every: u64,

    /// Log every message received
    #[arg(long, env = "ANALYZER_VERBOSE", default_value_t = false, action = clap::ArgAction::Set)]
    verbose: bool,

    /// Re-hash payloads against their trailing checksum
    #[arg(long, env = "ANALYZER_VALIDATE_CHECKSUMS", default_value_t = true, action = clap::ArgAction::Set)]
    validate_checksums: bool,

    /// Scale the weight by a random 0.8-1.2 factor every 5000 messages
    #[arg(long, env = "ANALYZER_VARY_WEIGHT", default_value_t = false, action = clap::ArgAction::Set)]
    vary_weight: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging();

    let analyzer_id = if args.id.is_empty() {
        let host = std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".into());
        format!("analyzer_{host}_{}", std::process::id())
    } else {
        args.id.clone()
    };

    tracing::info!(
        analyzer = %analyzer_id,
        target = %args.addr,
        weight = args.weight,
        ack_every = args.ack_every,
        validate_checksums = args.validate_checksums,
        "analyzer starting"
    );

    let mut client = AnalyzerClient::connect(&args.addr, args.weight)
        .await
        .context("failed to connect to distributor")?;
    tracing::info!(target = %args.addr, weight = args.weight, "registered");

    let ack_every = args.ack_every.max(1);
    let mut weight = args.weight;
    let mut rng = StdRng::from_entropy();

    let mut received: u64 = 0;
    let mut invalid_checksums: u64 = 0;
    let mut priority_counts = vec![0u64; 256];
    let mut last_reported: u64 = 0;

    let mut report = tokio::time::interval(Duration::from_secs(1));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                tracing::info!("interrupted");
                break;
            }
            _ = report.tick() => {
                let rate = received - last_reported;
                if rate > 0 {
                    tracing::info!(
                        analyzer = %analyzer_id,
                        rate,
                        total = received,
                        invalid = invalid_checksums,
                        weight,
                        "per-second stats"
                    );
                }
                last_reported = received;
            }
            result = client.recv() => {
                let msg = match result {
                    Ok(Some(msg)) => msg,
                    Ok(None) => {
                        tracing::info!("distributor closed the session");
                        break;
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "receive failed");
                        break;
                    }
                };

                received += 1;
                priority_counts[msg.priority() as usize] += 1;

                if args.validate_checksums && !validate_payload(msg.payload()) {
                    invalid_checksums += 1;
                    if args.verbose {
                        tracing::warn!(message = received, "invalid checksum");
                    }
                }

                if args.verbose {
                    tracing::info!(
                        message = received,
                        severity = msg.priority(),
                        bytes = msg.len(),
                        "received"
                    );
                }

                if received % ack_every == 0 {
                    let seq = (received & u64::from(SEQ_MASK)) as u32;
                    if let Err(e) = client.ack(seq).await {
                        tracing::error!(error = %e, "ack failed");
                        break;
                    }
                }

                if args.vary_weight && received % 5000 == 0 {
                    let new_weight = weight * (0.8 + 0.4 * rng.gen::<f32>());
                    match client.update_weight(new_weight).await {
                        Ok(()) => {
                            tracing::info!(old = weight, new = new_weight, "weight updated");
                            weight = new_weight;
                        }
                        Err(e) => tracing::error!(error = %e, "weight update failed"),
                    }
                }
            }
        }
    }

    tracing::info!(
        analyzer = %analyzer_id,
        received,
        invalid = invalid_checksums,
        "analyzer finished"
    );
    for (priority, count) in priority_counts.iter().enumerate() {
        if *count > 0 {
            tracing::info!(priority, count = *count, "priority distribution");
        }
    }

    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}
