//! Application state management for the exporter.
//!
//! This module defines the shared application state that is passed
//! to HTTP handlers. The collection loop owns its own handles to the
//! store and health stats.

use prometheus::Registry;
use std::sync::Arc;
use std::time::Instant;

use fping_exporter::{HealthStats, MetricStore};

use crate::config::Config;
use crate::metrics::ProbeMetrics;

/// Type alias for shared application state.
pub type SharedState = Arc<AppState>;

/// Global application state shared across requests and background tasks.
pub struct AppState {
    pub registry: Registry,
    pub metrics: ProbeMetrics,
    pub store: Arc<MetricStore>,
    pub config: Arc<Config>,
    pub health_stats: Arc<HealthStats>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Builds the state and registers all metrics on a fresh registry.
    pub fn new(
        config: Arc<Config>,
        store: Arc<MetricStore>,
        health_stats: Arc<HealthStats>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let registry = Registry::new();
        let metrics = ProbeMetrics::new(&registry)?;
        Ok(Self {
            registry,
            metrics,
            store,
            config,
            health_stats,
            start_time: Instant::now(),
        })
    }
}
