//! Single-slot store for the latest snapshot.
//!
//! The scheduler replaces the whole snapshot each cycle by swapping an `Arc`
//! under a briefly held lock; readers clone the `Arc` and never see a mix of
//! two cycles. The lock is never held across a probe invocation.

use std::sync::{Arc, RwLock as StdRwLock};

use crate::snapshot::{LoopStats, MetricSnapshot};

pub struct MetricStore {
    targets: Arc<[String]>,
    current: StdRwLock<Arc<MetricSnapshot>>,
    loop_stats: StdRwLock<LoopStats>,
}

impl MetricStore {
    /// Creates a store pre-filled with sentinel records for `targets`.
    pub fn new(targets: Vec<String>) -> Self {
        let snapshot = MetricSnapshot::defaults_for(&targets);
        Self {
            targets: targets.into(),
            current: StdRwLock::new(Arc::new(snapshot)),
            loop_stats: StdRwLock::new(LoopStats::default()),
        }
    }

    /// Configured targets, in configuration order.
    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    /// Replaces the current snapshot (last write wins).
    pub fn update(&self, snapshot: MetricSnapshot) {
        let snapshot = Arc::new(snapshot);
        match self.current.write() {
            Ok(mut guard) => *guard = snapshot,
            Err(poisoned) => *poisoned.into_inner() = snapshot,
        }
    }

    /// Returns the current snapshot.
    pub fn read(&self) -> Arc<MetricSnapshot> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    pub fn record_loop(&self, stats: LoopStats) {
        match self.loop_stats.write() {
            Ok(mut guard) => *guard = stats,
            Err(poisoned) => *poisoned.into_inner() = stats,
        }
    }

    pub fn loop_stats(&self) -> LoopStats {
        match self.loop_stats.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}
