//! Configuration display endpoint handler.
//!
//! This module provides the `/config` endpoint handler that displays
//! the effective exporter configuration.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use std::fmt::Write as FmtWrite;
use tracing::{debug, instrument};

use crate::config::{DEFAULT_BIND_ADDR, DEFAULT_PORT};
use crate::handlers::health::FOOTER_TEXT;
use crate::state::SharedState;

/// Handler for the /config endpoint.
#[instrument(skip(state))]
pub async fn config_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing /config request");

    // Track HTTP request
    state.health_stats.record_http_request();

    let cfg = &state.config;
    let settings = cfg.probe_settings();

    let mut out = String::new();

    writeln!(out, "FPING EXPORTER - CONFIGURATION").ok();
    writeln!(out, "==============================").ok();
    writeln!(out).ok();

    writeln!(out, "SERVER CONFIGURATION").ok();
    writeln!(out, "--------------------").ok();
    writeln!(
        out,
        "bind:                 {}",
        cfg.bind.as_deref().unwrap_or(DEFAULT_BIND_ADDR)
    )
    .ok();
    writeln!(
        out,
        "port:                 {}",
        cfg.port.unwrap_or(DEFAULT_PORT)
    )
    .ok();
    writeln!(
        out,
        "enable_health:        {}",
        cfg.enable_health.unwrap_or(true)
    )
    .ok();
    writeln!(out).ok();

    writeln!(out, "TLS/SSL CONFIGURATION").ok();
    writeln!(out, "---------------------").ok();
    writeln!(
        out,
        "enable_tls:           {}",
        cfg.enable_tls.unwrap_or(false)
    )
    .ok();
    writeln!(
        out,
        "tls_cert_path:        {}",
        cfg.tls_cert_path.as_deref().unwrap_or("none")
    )
    .ok();
    writeln!(
        out,
        "tls_key_path:         {}",
        cfg.tls_key_path.as_deref().unwrap_or("none")
    )
    .ok();
    writeln!(out).ok();

    writeln!(out, "TARGETS").ok();
    writeln!(out, "-------").ok();
    for target in state.store.targets() {
        writeln!(out, "  - {}", target).ok();
    }
    writeln!(out).ok();

    writeln!(out, "SCHEDULING").ok();
    writeln!(out, "----------").ok();
    match cfg.scheduler_config() {
        Ok(sched) => {
            writeln!(
                out,
                "interval:             {} seconds",
                sched.interval.as_secs()
            )
            .ok();
            writeln!(out, "schedule:             {}", sched.policy.as_str()).ok();
            writeln!(
                out,
                "watchdog:             {:.1} seconds",
                sched.watchdog.as_secs_f64()
            )
            .ok();
        }
        Err(e) => {
            writeln!(out, "invalid:              {}", e).ok();
        }
    }
    writeln!(out).ok();

    writeln!(out, "FPING").ok();
    writeln!(out, "-----").ok();
    writeln!(out, "fping_path:           {}", settings.binary).ok();
    writeln!(out, "count:                {}", settings.count).ok();
    writeln!(out, "period_ms:            {}", settings.period_ms).ok();
    writeln!(out, "timeout_ms:           {}", settings.timeout_ms).ok();
    writeln!(out, "payload_bytes:        {}", settings.payload_bytes).ok();
    writeln!(out).ok();

    writeln!(out, "LOGGING").ok();
    writeln!(out, "-------").ok();
    writeln!(
        out,
        "log_level:            {}",
        cfg.log_level.as_deref().unwrap_or("info")
    )
    .ok();
    writeln!(
        out,
        "log_file:             {}",
        cfg.log_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "none".to_string())
    )
    .ok();
    writeln!(out).ok();
    writeln!(out, "{FOOTER_TEXT}").ok();

    (
        StatusCode::OK,
        [("Content-Type", "text/plain; charset=utf-8")],
        out,
    )
}
