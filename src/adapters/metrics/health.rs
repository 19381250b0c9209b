//! Health Check Server - Liveness, Readiness and Metrics
//!
//! Exposes /live, /ready and /metrics via axum 0.7. Readiness means
//! the ledger and the content store both answered their last probe
//! and the round loop is running.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use tokio::sync::broadcast;
use tracing::{error, info, instrument};

use super::prometheus::OracleMetrics;

/// Shared health state polled by readiness probes.
#[derive(Debug, Clone)]
pub struct HealthState {
    /// Whether the ledger RPC answered.
    pub ledger_healthy: Arc<AtomicBool>,
    /// Whether the content store answered.
    pub store_healthy: Arc<AtomicBool>,
    /// Whether the round loop is running.
    pub loop_running: Arc<AtomicBool>,
}

impl HealthState {
    /// Create a new health state: collaborators healthy, loop not yet started.
    pub fn new() -> Self {
        Self {
            ledger_healthy: Arc::new(AtomicBool::new(true)),
            store_healthy: Arc::new(AtomicBool::new(true)),
            loop_running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Check if the oracle is ready.
    pub fn is_ready(&self) -> bool {
        self.ledger_healthy.load(Ordering::Relaxed)
            && self.store_healthy.load(Ordering::Relaxed)
            && self.loop_running.load(Ordering::Relaxed)
    }
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
struct AppState {
    health: Arc<HealthState>,
    metrics: Arc<OracleMetrics>,
}

/// Axum-based health and metrics HTTP server.
pub struct HealthServer {
    state: AppState,
    bind_address: String,
}

impl HealthServer {
    /// Create a new server.
    pub fn new(health: Arc<HealthState>, metrics: Arc<OracleMetrics>, bind_address: String) -> Self {
        Self {
            state: AppState { health, metrics },
            bind_address,
        }
    }

    fn router(&self) -> Router {
        Router::new()
            .route("/live", get(Self::liveness))
            .route("/ready", get(Self::readiness))
            .route("/metrics", get(Self::metrics))
            .with_state(self.state.clone())
    }

    /// Serve until the shutdown signal fires.
    #[instrument(skip(self, shutdown_rx), fields(address = %self.bind_address))]
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) -> anyhow::Result<()> {
        let app = self.router();
        let listener = tokio::net::TcpListener::bind(&self.bind_address).await?;

        info!("Health and metrics server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }

    /// Liveness probe: always returns 200 if the process is running.
    async fn liveness() -> impl IntoResponse {
        (StatusCode::OK, "OK")
    }

    async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
        if state.health.is_ready() {
            (StatusCode::OK, "READY")
        } else {
            (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
        }
    }

    async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
        match state.metrics.render() {
            Ok(body) => (StatusCode::OK, body),
            Err(e) => {
                error!(error = %e, "Failed to encode metrics");
                (StatusCode::INTERNAL_SERVER_ERROR, String::new())
            }
        }
    }
}
