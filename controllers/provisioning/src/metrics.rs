//! Prometheus metrics and the probe/metrics HTTP endpoint.

use crate::error::ControllerError;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Reconcile metrics, registered on a private registry.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    reconciliations: IntCounterVec,
    reconcile_duration: Histogram,
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

impl Metrics {
    pub fn new() -> Result<Self, ControllerError> {
        let registry = Registry::new();

        let reconciliations = IntCounterVec::new(
            Opts::new(
                "provisioning_reconciliations_total",
                "Provisioning reconcile passes by outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(reconciliations.clone()))?;

        let reconcile_duration = Histogram::with_opts(HistogramOpts::new(
            "provisioning_reconcile_duration_seconds",
            "Duration of Provisioning reconcile passes",
        ))?;
        registry.register(Box::new(reconcile_duration.clone()))?;

        Ok(Self {
            registry,
            reconciliations,
            reconcile_duration,
        })
    }

    /// Records one finished pass.
    pub fn record(&self, outcome: &str, elapsed: Duration) {
        self.reconciliations.with_label_values(&[outcome]).inc();
        self.reconcile_duration.observe(elapsed.as_secs_f64());
    }

    #[cfg(test)]
    pub fn reconciliations(&self, outcome: &str) -> u64 {
        self.reconciliations.with_label_values(&[outcome]).get()
    }

    /// Encodes every registered metric in the Prometheus text format.
    pub fn encode_text(&self) -> Result<String, ControllerError> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| ControllerError::Metrics(prometheus::Error::Msg(e.to_string())))
    }
}

#[derive(Clone)]
struct ProbeState {
    metrics: Metrics,
    ready: Arc<AtomicBool>,
}

/// Router serving `/healthz`, `/readyz` and `/metrics`.
pub fn router(metrics: Metrics, ready: Arc<AtomicBool>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics_handler))
        .with_state(ProbeState { metrics, ready })
        .layer(TraceLayer::new_for_http())
}

/// Serves the probe router on `addr` until the process exits.
pub async fn serve(addr: SocketAddr, metrics: Metrics, ready: Arc<AtomicBool>) -> Result<(), ControllerError> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Probe and metrics server listening");
    axum::serve(listener, router(metrics, ready)).await?;
    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

async fn readyz(State(state): State<ProbeState>) -> Response {
    if state.ready.load(Ordering::Relaxed) {
        (StatusCode::OK, "ready").into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not ready").into_response()
    }
}

async fn metrics_handler(State(state): State<ProbeState>) -> Response {
    match state.metrics.encode_text() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Failed to encode metrics: {e}")).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_counts_by_outcome() {
        let metrics = Metrics::new().unwrap();
        metrics.record("synced", Duration::from_millis(20));
        metrics.record("synced", Duration::from_millis(30));
        metrics.record("error", Duration::from_millis(5));

        assert_eq!(metrics.reconciliations("synced"), 2);
        assert_eq!(metrics.reconciliations("error"), 1);
        assert_eq!(metrics.reconciliations("ignored"), 0);
    }

    #[test]
    fn test_encode_text() {
        let metrics = Metrics::new().unwrap();
        metrics.record("synced", Duration::from_millis(20));

        let text = metrics.encode_text().unwrap();
        assert!(text.contains("provisioning_reconciliations_total{outcome=\"synced\"} 1"), "{text}");
        assert!(text.contains("provisioning_reconcile_duration_seconds_count 1"), "{text}");
    }

    #[tokio::test]
    async fn test_readyz_reflects_flag() {
        let ready = Arc::new(AtomicBool::new(false));
        let state = ProbeState {
            metrics: Metrics::new().unwrap(),
            ready: ready.clone(),
        };

        let response = readyz(State(state.clone())).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        ready.store(true, Ordering::Relaxed);
        let response = readyz(State(state)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
