//! Snapshot endpoint handler.
//!
//! Returns the currently published snapshot and the last loop statistics
//! as JSON, with results listed in configured target order.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use tracing::{debug, error, instrument};

use fping_exporter::{LoopStats, ProbeResult};

use crate::state::SharedState;

#[derive(Serialize)]
struct TargetEntry<'a> {
    target: &'a str,
    #[serde(flatten)]
    result: ProbeResult,
}

#[derive(Serialize)]
struct SnapshotResponse<'a> {
    cycle: u64,
    success: bool,
    completed_at: Option<String>,
    loop_stats: LoopStats,
    results: Vec<TargetEntry<'a>>,
}

/// Handler for the /snapshot endpoint.
#[instrument(skip(state))]
pub async fn snapshot_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing /snapshot request");
    state.health_stats.record_http_request();

    let snapshot = state.store.read();
    let results = state
        .store
        .targets()
        .iter()
        .filter_map(|t| {
            snapshot.get(t).map(|r| TargetEntry {
                target: t.as_str(),
                result: *r,
            })
        })
        .collect();

    let body = SnapshotResponse {
        cycle: snapshot.cycle,
        success: snapshot.success,
        completed_at: snapshot.completed_at.map(|t| t.to_rfc3339()),
        loop_stats: state.store.loop_stats(),
        results,
    };

    match serde_json::to_string_pretty(&body) {
        Ok(json) => (
            StatusCode::OK,
            [("Content-Type", "application/json")],
            json,
        ),
        Err(e) => {
            error!("Failed to serialize snapshot: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("Content-Type", "text/plain; charset=utf-8")],
                "Failed to serialize snapshot".to_string(),
            )
        }
    }
}
