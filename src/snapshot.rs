//! Result types shared by the parser, the store and the HTTP layer.
//!
//! A `MetricSnapshot` always holds exactly one `ProbeResult` per configured
//! target. Targets without a successful measurement carry the sentinel
//! record (loss 100, latencies -1, counts 0).

use ahash::AHashMap as HashMap;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Sentinel latency for "no measurement". Valid latencies are >= 0.
pub const NO_LATENCY_MS: f64 = -1.0;

/// Sentinel loss for "no measurement".
pub const FULL_LOSS_PCT: f64 = 100.0;

/// Statistics for one target from one probe cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProbeResult {
    pub min_latency_ms: f64,
    pub avg_latency_ms: f64,
    pub max_latency_ms: f64,
    pub loss_pct: f64,
    pub sent: u64,
    pub received: u64,
}

impl Default for ProbeResult {
    fn default() -> Self {
        Self {
            min_latency_ms: NO_LATENCY_MS,
            avg_latency_ms: NO_LATENCY_MS,
            max_latency_ms: NO_LATENCY_MS,
            loss_pct: FULL_LOSS_PCT,
            sent: 0,
            received: 0,
        }
    }
}

impl ProbeResult {
    /// True when the latency triple came from a real measurement.
    pub fn has_latency(&self) -> bool {
        self.avg_latency_ms >= 0.0
    }

    /// True when nothing at all was measured for the target.
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Complete per-target results as of one finished cycle.
#[derive(Debug, Clone)]
pub struct MetricSnapshot {
    /// Cycle number that produced the snapshot (0 = startup placeholder).
    pub cycle: u64,
    /// Whether the probe ran and its output was parsed.
    pub success: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub results: HashMap<String, ProbeResult>,
}

impl MetricSnapshot {
    /// Snapshot with the sentinel record for every target.
    pub fn defaults_for(targets: &[String]) -> Self {
        Self {
            cycle: 0,
            success: false,
            completed_at: None,
            results: default_results(targets),
        }
    }

    pub fn get(&self, target: &str) -> Option<&ProbeResult> {
        self.results.get(target)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Builds the pre-scan map: every target mapped to the sentinel record.
pub fn default_results(targets: &[String]) -> HashMap<String, ProbeResult> {
    targets
        .iter()
        .map(|t| (t.clone(), ProbeResult::default()))
        .collect()
}

/// Timing and outcome of the most recent collection cycle.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct LoopStats {
    pub cycle: u64,
    pub duration_seconds: f64,
    pub success: bool,
    pub field_errors: u64,
}
