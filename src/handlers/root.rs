//! Root endpoint handler for the landing page.
//!
//! This module provides the `/` endpoint handler that displays
//! a landing page with the probed targets and available endpoints.

use axum::{
    extract::State,
    response::{Html, IntoResponse},
};
use std::fmt::Write as FmtWrite;
use tracing::{debug, instrument};

use crate::handlers::health::FOOTER_TEXT;
use crate::state::SharedState;

/// Handler for the root `/` endpoint.
#[instrument(skip(state))]
pub async fn root_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing / request");
    state.health_stats.record_http_request();

    let version = env!("CARGO_PKG_VERSION");
    let built = env!("VERGEN_BUILD_TIMESTAMP");

    // Calculate actual uptime from service start time
    let uptime_secs = state.start_time.elapsed().as_secs();
    let hours = uptime_secs / 3600;
    let minutes = (uptime_secs % 3600) / 60;
    let seconds = uptime_secs % 60;
    let uptime_str = format!("{}h {}m {}s", hours, minutes, seconds);

    let snapshot = state.store.read();
    let mut rows = String::new();
    for target in state.store.targets() {
        let Some(r) = snapshot.get(target) else {
            continue;
        };
        writeln!(
            rows,
            "        <tr><td>{}</td><td>{:.3}</td><td>{:.3}</td><td>{:.3}</td><td>{:.1}</td><td>{}/{}</td></tr>",
            html_escape(target),
            r.min_latency_ms,
            r.avg_latency_ms,
            r.max_latency_ms,
            r.loss_pct,
            r.received,
            r.sent
        )
        .ok();
    }

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>fping Exporter</title>
    <style>
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            margin: 0;
            padding: 20px;
            background: #f5f5f5;
            line-height: 1.6;
        }}
        .container {{
            max-width: 900px;
            margin: 0 auto;
            background: white;
            padding: 40px;
            border-radius: 8px;
            box-shadow: 0 2px 8px rgba(0,0,0,0.1);
        }}
        h1 {{ color: #333; border-bottom: 3px solid #2e7d32; padding-bottom: 15px; }}
        h2 {{ color: #555; margin-top: 35px; }}
        .info {{ background: #e9ecef; padding: 15px; border-radius: 4px; }}
        table {{ border-collapse: collapse; width: 100%; }}
        th, td {{ border-bottom: 1px solid #ddd; padding: 6px 10px; text-align: right; }}
        th:first-child, td:first-child {{ text-align: left; }}
        .endpoint-list li {{ margin: 10px 0; }}
        .footer {{ margin-top: 40px; color: #666; font-size: 0.9em; text-align: center; }}
    </style>
</head>
<body>
<div class="container">
    <h1>fping Exporter</h1>

    <div class="info">
        Version <b>{version}</b> (built {built}) &middot; Uptime <b>{uptime}</b> &middot;
        Cycle <b>{cycle}</b> &middot; Last cycle {status}
    </div>

    <h2>Targets</h2>
    <table>
        <tr><th>Target</th><th>min (ms)</th><th>avg (ms)</th><th>max (ms)</th><th>loss (%)</th><th>rcv/xmt</th></tr>
{rows}    </table>

    <h2>Available Endpoints</h2>
    <ul class="endpoint-list">
        <li><a href="/metrics">/metrics</a> - Prometheus-compatible metrics endpoint</li>
        <li><a href="/health">/health</a> - Exporter internal health statistics (text)</li>
        <li><a href="/config">/config</a> - Active runtime configuration (text)</li>
        <li><a href="/snapshot">/snapshot</a> - Current snapshot and loop statistics (JSON)</li>
    </ul>

    <div class="footer">
        <p>{footer}</p>
    </div>
</div>
</body>
</html>"#,
        version = version,
        built = built,
        uptime = uptime_str,
        cycle = snapshot.cycle,
        status = if snapshot.success { "succeeded" } else { "failed" },
        rows = rows,
        footer = FOOTER_TEXT
    );

    Html(html)
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
