//! Prometheus metrics definitions for fping-exporter.
//!
//! Per-target gauges are reset and refilled from the current snapshot on every
//! scrape, so a target always exposes exactly one series per label set. The
//! refill and the gather run under one lock so overlapping scrapes never see
//! each other's half-filled gauges.

use prometheus::{Encoder, Gauge, GaugeVec, Opts, Registry, TextEncoder};
use std::sync::{Arc, Mutex};

use fping_exporter::{LoopStats, MetricSnapshot};

/// Latency stat label values, in exposition order.
pub const LATENCY_STATS: [&str; 3] = ["min", "avg", "max"];

/// Collection of Prometheus metrics exposed on `/metrics`.
#[derive(Clone)]
pub struct ProbeMetrics {
    // ========== Per-target Metrics ==========
    pub latency_ms: GaugeVec,       // labels: target, stat
    pub loss_percent: GaugeVec,     // labels: target
    pub packets_sent: GaugeVec,     // labels: target
    pub packets_received: GaugeVec, // labels: target
    pub loop_duration_seconds: Gauge,

    // ========== Exporter Telemetry ==========
    pub cycle_success: Gauge,
    pub cycles_total: Gauge,
    pub scrape_duration_seconds: Gauge,
    pub parse_field_errors: Gauge,

    // Serializes observe + gather across scrapes
    scrape_lock: Arc<Mutex<()>>,
}

impl ProbeMetrics {
    /// Creates and registers all Prometheus metrics with the registry.
    pub fn new(registry: &Registry) -> Result<Self, Box<dyn std::error::Error>> {
        let latency_ms = GaugeVec::new(
            Opts::new(
                "fping_latency_ms",
                "Round-trip latency in milliseconds (-1 when no reply was received)",
            ),
            &["target", "stat"],
        )?;
        let loss_percent = GaugeVec::new(
            Opts::new("fping_loss_percent", "Packet loss in percent (0-100)"),
            &["target"],
        )?;
        let packets_sent = GaugeVec::new(
            Opts::new("fping_packets_sent", "Packets sent in the last cycle"),
            &["target"],
        )?;
        let packets_received = GaugeVec::new(
            Opts::new("fping_packets_received", "Packets received in the last cycle"),
            &["target"],
        )?;
        let loop_duration_seconds = Gauge::new(
            "fping_loop_duration_seconds",
            "Wall-clock duration of the last collection cycle in seconds",
        )?;

        let cycle_success = Gauge::new(
            "fping_exporter_cycle_success",
            "Whether the last cycle produced fping output (1 = success, 0 = failure)",
        )?;
        let cycles_total = Gauge::new(
            "fping_exporter_cycles_total",
            "Number of collection cycles completed since start",
        )?;
        let scrape_duration_seconds = Gauge::new(
            "fping_exporter_scrape_duration_seconds",
            "Time spent rendering the previous /metrics response",
        )?;
        let parse_field_errors = Gauge::new(
            "fping_exporter_parse_field_errors",
            "Malformed fping fields in the last cycle",
        )?;

        registry.register(Box::new(latency_ms.clone()))?;
        registry.register(Box::new(loss_percent.clone()))?;
        registry.register(Box::new(packets_sent.clone()))?;
        registry.register(Box::new(packets_received.clone()))?;
        registry.register(Box::new(loop_duration_seconds.clone()))?;
        registry.register(Box::new(cycle_success.clone()))?;
        registry.register(Box::new(cycles_total.clone()))?;
        registry.register(Box::new(scrape_duration_seconds.clone()))?;
        registry.register(Box::new(parse_field_errors.clone()))?;

        Ok(Self {
            latency_ms,
            loss_percent,
            packets_sent,
            packets_received,
            loop_duration_seconds,
            cycle_success,
            cycles_total,
            scrape_duration_seconds,
            parse_field_errors,
            scrape_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Resets all per-target gauges.
    pub fn reset_target_metrics(&self) {
        self.latency_ms.reset();
        self.loss_percent.reset();
        self.packets_sent.reset();
        self.packets_received.reset();
    }

    /// Fills the gauges from one snapshot. `targets` fixes the output order.
    pub fn observe(&self, targets: &[String], snapshot: &MetricSnapshot, loop_stats: &LoopStats) {
        self.reset_target_metrics();

        for target in targets {
            let Some(r) = snapshot.get(target) else {
                continue;
            };
            let latencies = [r.min_latency_ms, r.avg_latency_ms, r.max_latency_ms];
            for (stat, value) in LATENCY_STATS.iter().zip(latencies) {
                self.latency_ms
                    .with_label_values(&[target.as_str(), *stat])
                    .set(value);
            }
            self.loss_percent
                .with_label_values(&[target.as_str()])
                .set(r.loss_pct);
            self.packets_sent
                .with_label_values(&[target.as_str()])
                .set(r.sent as f64);
            self.packets_received
                .with_label_values(&[target.as_str()])
                .set(r.received as f64);
        }

        self.loop_duration_seconds.set(loop_stats.duration_seconds);
        self.cycle_success
            .set(if snapshot.success { 1.0 } else { 0.0 });
        self.cycles_total.set(loop_stats.cycle as f64);
        self.parse_field_errors.set(loop_stats.field_errors as f64);
    }

    /// Fills the gauges from `snapshot` and encodes the whole registry in the
    /// Prometheus text format as one step.
    pub fn encode(
        &self,
        registry: &Registry,
        targets: &[String],
        snapshot: &MetricSnapshot,
        loop_stats: &LoopStats,
        buffer: &mut Vec<u8>,
    ) -> prometheus::Result<()> {
        let _guard = match self.scrape_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        self.observe(targets, snapshot, loop_stats);
        let families = registry.gather();
        TextEncoder::new().encode(&families, buffer)
    }
}
