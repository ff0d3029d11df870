//! Server assembly and lifecycle
//!
//! Wires one shared router to both TCP servers, starts the optional
//! diagnostics endpoint, and coordinates shutdown through a single
//! cancellation token.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use ferry_distributor::{
    AnalyzerServer, AnalyzerServerConfig, EmitterServer, EmitterServerConfig,
};
use ferry_routing::WeightedRouter;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::diag::{self, DiagState};
use crate::Cli;

/// Run the distributor until a shutdown signal arrives
pub async fn run(cli: Cli) -> Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        emitter_port = cli.emitter_port,
        analyzer_port = cli.analyzer_port,
        ack_timeout_secs = cli.ack_timeout,
        "ferry starting"
    );

    let cancel = CancellationToken::new();
    let router = Arc::new(WeightedRouter::new());

    let emitter_config = EmitterServerConfig {
        address: cli.address.clone(),
        port: cli.emitter_port,
        ..Default::default()
    };
    let analyzer_config = AnalyzerServerConfig {
        address: cli.address.clone(),
        port: cli.analyzer_port,
        ack_timeout: Duration::from_secs(cli.ack_timeout.max(1)),
        ..Default::default()
    };

    let emitter_server = EmitterServer::new(emitter_config, Arc::clone(&router));
    let analyzer_server = AnalyzerServer::new(analyzer_config, Arc::clone(&router));

    let emitter_metrics = emitter_server.metrics();
    let analyzer_metrics = analyzer_server.metrics();

    if cli.diag_port > 0 {
        let state = DiagState {
            emitter: Arc::clone(&emitter_metrics),
            analyzer: Arc::clone(&analyzer_metrics),
            router: router.metrics(),
        };
        let diag_cancel = cancel.clone();
        let diag_port = cli.diag_port;
        tokio::spawn(async move {
            if let Err(e) = diag::run(diag_port, state, diag_cancel).await {
                tracing::error!(error = %e, "diagnostics server failed");
            }
        });
    }

    let mut emitter_task = tokio::spawn(emitter_server.run(cancel.clone()));
    let mut analyzer_task = tokio::spawn(analyzer_server.run(cancel.clone()));

    info!("ferry started");

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for shutdown signal")?;
            info!("shutdown signal received");
        }
        result = &mut emitter_task => {
            cancel.cancel();
            let _ = analyzer_task.await;
            result.context("emitter server panicked")?
                .context("emitter server failed")?;
            anyhow::bail!("emitter server exited unexpectedly");
        }
        result = &mut analyzer_task => {
            cancel.cancel();
            let _ = emitter_task.await;
            result.context("analyzer server panicked")?
                .context("analyzer server failed")?;
            anyhow::bail!("analyzer server exited unexpectedly");
        }
    }

    // Cooperative shutdown: close the listeners, let sessions unwind and
    // re-route whatever they still hold.
    cancel.cancel();
    emitter_task
        .await
        .context("emitter server panicked")?
        .context("emitter server failed")?;
    analyzer_task
        .await
        .context("analyzer server panicked")?
        .context("analyzer server failed")?;

    let emitters = emitter_metrics.snapshot();
    let analyzers = analyzer_metrics.snapshot();
    let routing = router.metrics().snapshot();
    info!(
        frames_received = emitters.frames_received,
        frames_written = analyzers.frames_written,
        messages_routed = routing.messages_routed,
        messages_dropped = routing.messages_dropped,
        messages_rerouted = analyzers.messages_rerouted,
        "ferry shutdown complete"
    );

    Ok(())
}
