//! Health statistics for the collector itself.
//!
//! Tracks cycle timing, probe failures, parse field errors and HTTP traffic.
//! Rendered as a plain-text table by the `/health` endpoint.

use std::collections::VecDeque;
use std::fmt::Write as FmtWrite;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock as StdRwLock};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

/// Running statistics for a single metric.
#[derive(Clone, Copy, Default)]
pub struct RunningStat {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
    last: f64,
}

impl RunningStat {
    pub fn add(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
            self.last = value;
            self.sum = value;
            self.count = 1;
            return;
        }
        self.count += 1;
        self.sum += value;
        self.last = value;
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    pub fn avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / (self.count as f64)
        }
    }
}

/// Thread-safe wrapper for running statistics.
#[derive(Default)]
pub struct Stat {
    inner: Mutex<RunningStat>,
}

impl Stat {
    pub fn add_sample(&self, value: f64) {
        if let Ok(mut s) = self.inner.lock() {
            s.add(value);
        }
    }

    /// (last, avg, max, min, count)
    pub fn snapshot(&self) -> (f64, f64, f64, f64, u64) {
        if let Ok(s) = self.inner.lock() {
            (s.last, s.avg(), s.max, s.min, s.count)
        } else {
            (0.0, 0.0, 0.0, 0.0, 0)
        }
    }
}

/// Sliding window of HTTP request timestamps.
pub struct RequestTimestamps {
    inner: Mutex<VecDeque<Instant>>,
}

impl Default for RequestTimestamps {
    fn default() -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(256)),
        }
    }
}

impl RequestTimestamps {
    pub fn record(&self) {
        if let Ok(mut guard) = self.inner.lock() {
            let now = Instant::now();
            guard.push_back(now);
            // Keep only the last 10 minutes
            if let Some(cutoff) = now.checked_sub(Duration::from_secs(600)) {
                while guard.front().is_some_and(|&t| t < cutoff) {
                    guard.pop_front();
                }
            }
        }
    }

    pub fn count_last_minute(&self) -> u64 {
        if let Ok(guard) = self.inner.lock() {
            match Instant::now().checked_sub(Duration::from_secs(60)) {
                Some(cutoff) => guard.iter().filter(|&&t| t >= cutoff).count() as u64,
                None => guard.len() as u64,
            }
        } else {
            0
        }
    }
}

/// Collector health statistics.
pub struct HealthStats {
    // Cycle performance
    pub cycle_duration_seconds: Stat,
    pub probe_duration_seconds: Stat,
    pub cycles_total: AtomicU64,
    pub cycle_success_count: AtomicU64,
    pub cycle_failure_count: AtomicU64,

    // Error tracking
    pub probe_errors: AtomicU64,
    pub probe_timeouts: AtomicU64,
    pub parse_field_errors: AtomicU64,
    pub targets_without_data: Stat,

    // HTTP server stats
    pub http_request_timestamps: RequestTimestamps,
    pub scrape_duration_ms: Stat,
    pub metrics_endpoint_calls: AtomicU64,

    // Timing
    pub start_time: Instant,
    pub last_cycle_time: StdRwLock<Option<DateTime<Utc>>>,
}

impl Default for HealthStats {
    fn default() -> Self {
        Self {
            cycle_duration_seconds: Stat::default(),
            probe_duration_seconds: Stat::default(),
            cycles_total: AtomicU64::new(0),
            cycle_success_count: AtomicU64::new(0),
            cycle_failure_count: AtomicU64::new(0),
            probe_errors: AtomicU64::new(0),
            probe_timeouts: AtomicU64::new(0),
            parse_field_errors: AtomicU64::new(0),
            targets_without_data: Stat::default(),
            http_request_timestamps: RequestTimestamps::default(),
            scrape_duration_ms: Stat::default(),
            metrics_endpoint_calls: AtomicU64::new(0),
            start_time: Instant::now(),
            last_cycle_time: StdRwLock::new(None),
        }
    }
}

impl HealthStats {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn record_cycle(&self, duration_seconds: f64, success: bool) {
        self.cycle_duration_seconds.add_sample(duration_seconds);
        self.cycles_total.fetch_add(1, Ordering::Relaxed);
        if success {
            self.cycle_success_count.fetch_add(1, Ordering::Relaxed);
        } else {
            self.cycle_failure_count.fetch_add(1, Ordering::Relaxed);
        }
        if let Ok(mut guard) = self.last_cycle_time.write() {
            *guard = Some(Utc::now());
        }
    }

    pub fn record_probe_duration(&self, seconds: f64) {
        self.probe_duration_seconds.add_sample(seconds);
    }

    pub fn record_probe_error(&self) {
        self.probe_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_probe_timeout(&self) {
        self.probe_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_parse_field_errors(&self, count: u64) {
        self.parse_field_errors.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_targets_without_data(&self, count: u64) {
        self.targets_without_data.add_sample(count as f64);
    }

    pub fn record_http_request(&self) {
        self.http_request_timestamps.record();
    }

    pub fn record_scrape(&self, duration_ms: f64) {
        self.metrics_endpoint_calls.fetch_add(1, Ordering::Relaxed);
        self.scrape_duration_ms.add_sample(duration_ms);
    }

    pub fn get_cycle_success_rate(&self) -> f64 {
        let success = self.cycle_success_count.load(Ordering::Relaxed);
        let failure = self.cycle_failure_count.load(Ordering::Relaxed);
        let total = success + failure;
        if total == 0 {
            100.0
        } else {
            (success as f64 / total as f64) * 100.0
        }
    }

    pub fn get_uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn get_last_cycle_time_str(&self) -> String {
        match self.last_cycle_time.read() {
            Ok(guard) => match *guard {
                Some(t) => t.format("%H:%M:%S UTC").to_string(),
                None => "N/A".to_string(),
            },
            Err(_) => "N/A".to_string(),
        }
    }

    pub fn render_table(&self) -> String {
        let (cd_cur, cd_avg, cd_max, cd_min, _) = self.cycle_duration_seconds.snapshot();
        let (pd_cur, pd_avg, pd_max, pd_min, _) = self.probe_duration_seconds.snapshot();
        let (nd_cur, nd_avg, nd_max, nd_min, _) = self.targets_without_data.snapshot();
        let (sd_cur, sd_avg, sd_max, sd_min, _) = self.scrape_duration_ms.snapshot();

        let left_col = 26usize;
        let col_w = 12usize;

        let mut out = String::new();

        writeln!(out, "HEALTH ENDPOINT - COLLECTOR INTERNAL STATS").ok();
        writeln!(out, "==========================================").ok();
        writeln!(out).ok();

        writeln!(
            out,
            "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
            "",
            "current",
            "average",
            "max",
            "min",
            left = left_col,
            col = col_w
        )
        .ok();

        let row = |out: &mut String, name: &str, vals: [String; 4]| {
            writeln!(
                out,
                "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
                name,
                vals[0],
                vals[1],
                vals[2],
                vals[3],
                left = left_col,
                col = col_w
            )
            .ok();
        };

        writeln!(out).ok();
        writeln!(out, "CYCLE PERFORMANCE").ok();
        writeln!(out, "-----------------").ok();
        row(
            &mut out,
            "cycle_duration (s)",
            [
                format!("{:.3}", cd_cur),
                format!("{:.3}", cd_avg),
                format!("{:.3}", cd_max),
                format!("{:.3}", cd_min),
            ],
        );
        row(
            &mut out,
            "probe_duration (s)",
            [
                format!("{:.3}", pd_cur),
                format!("{:.3}", pd_avg),
                format!("{:.3}", pd_max),
                format!("{:.3}", pd_min),
            ],
        );
        row(
            &mut out,
            "targets_without_data",
            [
                format!("{:.0}", nd_cur),
                format!("{:.1}", nd_avg),
                format!("{:.0}", nd_max),
                format!("{:.0}", nd_min),
            ],
        );

        writeln!(out).ok();
        writeln!(out, "HTTP SERVER").ok();
        writeln!(out, "-----------").ok();
        row(
            &mut out,
            "scrape_duration (ms)",
            [
                format!("{:.2}", sd_cur),
                format!("{:.2}", sd_avg),
                format!("{:.2}", sd_max),
                format!("{:.2}", sd_min),
            ],
        );

        writeln!(out).ok();
        writeln!(out, "COUNTERS").ok();
        writeln!(out, "--------").ok();
        let counters = [
            ("cycles_total", self.cycles_total.load(Ordering::Relaxed)),
            (
                "cycle_failures",
                self.cycle_failure_count.load(Ordering::Relaxed),
            ),
            ("probe_errors", self.probe_errors.load(Ordering::Relaxed)),
            ("probe_timeouts", self.probe_timeouts.load(Ordering::Relaxed)),
            (
                "parse_field_errors",
                self.parse_field_errors.load(Ordering::Relaxed),
            ),
            (
                "metrics_requests",
                self.metrics_endpoint_calls.load(Ordering::Relaxed),
            ),
            (
                "http_requests_last_min",
                self.http_request_timestamps.count_last_minute(),
            ),
        ];
        for (name, value) in counters {
            writeln!(out, "{:left$} | {:>col$}", name, value, left = left_col, col = col_w).ok();
        }
        writeln!(
            out,
            "{:left$} | {:>col$.1}",
            "cycle_success_rate (%)",
            self.get_cycle_success_rate(),
            left = left_col,
            col = col_w
        )
        .ok();
        writeln!(
            out,
            "{:left$} | {:>col$}",
            "last_cycle",
            self.get_last_cycle_time_str(),
            left = left_col,
            col = col_w
        )
        .ok();

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stat() {
        let mut s = RunningStat::default();
        assert_eq!(s.avg(), 0.0);
        s.add(2.0);
        s.add(4.0);
        s.add(0.0);
        assert_eq!(s.avg(), 2.0);
        assert_eq!(s.min, 0.0);
        assert_eq!(s.max, 4.0);
        assert_eq!(s.last, 0.0);
    }

    #[test]
    fn test_cycle_success_rate() {
        let stats = HealthStats::new();
        assert_eq!(stats.get_cycle_success_rate(), 100.0);
        stats.record_cycle(1.0, true);
        stats.record_cycle(1.0, false);
        stats.record_cycle(1.0, true);
        stats.record_cycle(1.0, true);
        assert_eq!(stats.get_cycle_success_rate(), 75.0);
        assert_eq!(stats.cycles_total.load(Ordering::Relaxed), 4);
        assert_ne!(stats.get_last_cycle_time_str(), "N/A");
    }

    #[test]
    fn test_render_table_sections() {
        let stats = HealthStats::new();
        stats.record_cycle(15.5, true);
        stats.record_parse_field_errors(2);
        let table = stats.render_table();
        assert!(table.contains("CYCLE PERFORMANCE"));
        assert!(table.contains("parse_field_errors"));
        assert!(table.contains("15.500"));
    }
}
