//! Metrics endpoint handler for Prometheus scraping.
//!
//! This module provides the `/metrics` endpoint handler. It never waits on a
//! running probe: every scrape reads whatever snapshot is currently published.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use std::time::Instant;
use tracing::{debug, error, instrument};

use crate::state::SharedState;

/// Buffer capacity for metrics encoding.
const BUFFER_CAP: usize = 16 * 1024;

/// Error type for metrics endpoint failures.
#[derive(Debug)]
pub enum MetricsError {
    EncodingFailed,
}

impl IntoResponse for MetricsError {
    fn into_response(self) -> axum::response::Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to encode metrics",
        )
            .into_response()
    }
}

/// Handler for the /metrics endpoint.
#[instrument(skip(state))]
pub async fn metrics_handler(State(state): State<SharedState>) -> Result<String, MetricsError> {
    let start = Instant::now();
    debug!("Processing /metrics request");

    let snapshot = state.store.read();
    let loop_stats = state.store.loop_stats();
    let mut buffer = Vec::with_capacity(BUFFER_CAP);

    if let Err(e) = state.metrics.encode(
        &state.registry,
        state.store.targets(),
        &snapshot,
        &loop_stats,
        &mut buffer,
    ) {
        error!("Failed to encode Prometheus metrics: {}", e);
        return Err(MetricsError::EncodingFailed);
    }

    // Record metrics request statistics
    let request_duration_ms = start.elapsed().as_secs_f64() * 1000.0;
    state.health_stats.record_scrape(request_duration_ms);
    state.health_stats.record_http_request();
    state
        .metrics
        .scrape_duration_seconds
        .set(start.elapsed().as_secs_f64());

    debug!(
        "Metrics request completed: cycle {}, {} targets, {} bytes, {:.3}ms",
        snapshot.cycle,
        snapshot.len(),
        buffer.len(),
        request_duration_ms
    );

    String::from_utf8(buffer).map_err(|_| MetricsError::EncodingFailed)
}
