//! Diagnostics HTTP endpoint
//!
//! Optional listener (off by default) exposing liveness and counter
//! snapshots for the running distributor:
//!
//! - `GET /healthz` - liveness probe
//! - `GET /metrics` - JSON snapshot of emitter/analyzer/router counters

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use ferry_distributor::{AnalyzerMetrics, EmitterMetrics};
use ferry_routing::RouterMetrics;
use tokio_util::sync::CancellationToken;

/// Metrics handles shared with the diagnostics handlers
#[derive(Clone)]
pub struct DiagState {
    pub emitter: Arc<EmitterMetrics>,
    pub analyzer: Arc<AnalyzerMetrics>,
    pub router: Arc<RouterMetrics>,
}

/// Serve the diagnostics endpoint until cancelled
pub async fn run(port: u16, state: DiagState, cancel: CancellationToken) -> Result<()> {
    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("failed to bind diagnostics port {port}"))?;

    tracing::info!(port, "diagnostics server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await
        .context("diagnostics server error")?;

    tracing::info!("diagnostics server stopped");
    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

async fn metrics(State(state): State<DiagState>) -> Json<serde_json::Value> {
    let emitters = state.emitter.snapshot();
    let analyzers = state.analyzer.snapshot();
    let router = state.router.snapshot();

    Json(serde_json::json!({
        "emitters": {
            "connections_active": emitters.connections_active,
            "connections_total": emitters.connections_total,
            "frames_received": emitters.frames_received,
            "bytes_received": emitters.bytes_received,
            "protocol_errors": emitters.protocol_errors,
        },
        "analyzers": {
            "sessions_active": analyzers.sessions_active,
            "sessions_total": analyzers.sessions_total,
            "registrations_rejected": analyzers.registrations_rejected,
            "frames_written": analyzers.frames_written,
            "bytes_written": analyzers.bytes_written,
            "messages_acked": analyzers.messages_acked,
            "ack_timeouts": analyzers.ack_timeouts,
            "messages_rerouted": analyzers.messages_rerouted,
        },
        "router": {
            "messages_routed": router.messages_routed,
            "messages_dropped": router.messages_dropped,
            "route_retries": router.route_retries,
            "registrations": router.registrations,
            "unregistrations": router.unregistrations,
            "weight_updates": router.weight_updates,
        },
    }))
}
