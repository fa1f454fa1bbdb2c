//! Collection loop: probe, parse, publish, sleep.
//!
//! Every cycle publishes a complete snapshot. When the probe fails or the
//! watchdog fires, every target gets the sentinel record instead of keeping
//! the previous cycle's values.

use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::error::{ConfigError, ProbeError};
use crate::health_stats::HealthStats;
use crate::parser::parse_output;
use crate::prober::{ProbeSettings, Prober};
use crate::snapshot::{default_results, LoopStats, MetricSnapshot};
use crate::store::MetricStore;

/// How long to wait between cycles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulePolicy {
    /// Sleep the full interval after each cycle. The effective period is
    /// interval + cycle duration.
    #[default]
    Fixed,
    /// Sleep interval minus the cycle duration, saturating at zero.
    Periodic,
}

impl SchedulePolicy {
    pub fn sleep_after(&self, interval: Duration, elapsed: Duration) -> Duration {
        match self {
            SchedulePolicy::Fixed => interval,
            SchedulePolicy::Periodic => interval.saturating_sub(elapsed),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SchedulePolicy::Fixed => "fixed",
            SchedulePolicy::Periodic => "periodic",
        }
    }
}

impl FromStr for SchedulePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(SchedulePolicy::Fixed),
            "periodic" => Ok(SchedulePolicy::Periodic),
            other => Err(ConfigError::InvalidSchedule(other.to_string())),
        }
    }
}

/// Typed loop parameters, resolved from configuration at startup.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub settings: ProbeSettings,
    pub interval: Duration,
    pub policy: SchedulePolicy,
    /// Upper bound for one probe invocation.
    pub watchdog: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        let settings = ProbeSettings::default();
        let watchdog = settings.default_watchdog();
        Self {
            settings,
            interval: Duration::from_secs(1),
            policy: SchedulePolicy::Fixed,
            watchdog,
        }
    }
}

pub struct Scheduler<P: Prober> {
    prober: P,
    store: Arc<MetricStore>,
    health: Arc<HealthStats>,
    config: SchedulerConfig,
    cycle: u64,
}

impl<P: Prober> Scheduler<P> {
    pub fn new(
        prober: P,
        store: Arc<MetricStore>,
        health: Arc<HealthStats>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            prober,
            store,
            health,
            config,
            cycle: 0,
        }
    }

    /// Number of completed cycles.
    pub fn cycles(&self) -> u64 {
        self.cycle
    }

    /// Runs one probe, parse and publish cycle.
    #[instrument(skip(self))]
    pub async fn run_cycle(&mut self) -> LoopStats {
        let start = Instant::now();
        self.cycle += 1;
        let cycle = self.cycle;
        let targets = self.store.targets();

        debug!("Cycle {}: probing {} targets", cycle, targets.len());
        let probe = self.prober.probe(targets, &self.config.settings);
        let output = match tokio::time::timeout(self.config.watchdog, probe).await {
            Ok(Ok(output)) => Some(output),
            Ok(Err(e)) => {
                warn!("Cycle {}: probe failed: {}", cycle, e);
                self.health.record_probe_error();
                None
            }
            Err(_) => {
                let e = ProbeError::Timeout(self.config.watchdog);
                warn!("Cycle {}: {}, publishing defaults", cycle, e);
                self.health.record_probe_timeout();
                None
            }
        };
        self.health
            .record_probe_duration(start.elapsed().as_secs_f64());

        let (results, field_errors, success) = match output {
            Some(output) => {
                if output.is_empty() {
                    warn!("Cycle {}: probe produced no output", cycle);
                }
                debug!("Cycle {}: parsing {} bytes", cycle, output.stderr.len() + output.stdout.len());
                let parsed = parse_output(&output.combined(), targets);
                for e in &parsed.field_errors {
                    warn!("Cycle {}: {}", cycle, e);
                }
                (parsed.results, parsed.field_errors.len() as u64, true)
            }
            None => (default_results(targets), 0, false),
        };

        let without_data = results.values().filter(|r| r.is_default()).count() as u64;
        for target in targets {
            if let Some(r) = results.get(target) {
                debug!(
                    "Target {} - min {} ms, avg {} ms, max {} ms, loss {}%, sent {}, received {}",
                    target,
                    r.min_latency_ms,
                    r.avg_latency_ms,
                    r.max_latency_ms,
                    r.loss_pct,
                    r.sent,
                    r.received
                );
            }
        }

        self.store.update(MetricSnapshot {
            cycle,
            success,
            completed_at: Some(Utc::now()),
            results,
        });

        let stats = LoopStats {
            cycle,
            duration_seconds: start.elapsed().as_secs_f64(),
            success,
            field_errors,
        };
        self.store.record_loop(stats);

        self.health.record_cycle(stats.duration_seconds, success);
        self.health.record_parse_field_errors(field_errors);
        self.health.record_targets_without_data(without_data);

        info!(
            "Cycle {} completed: {} targets, {} without data, {} field errors, {:.3}s",
            cycle,
            targets.len(),
            without_data,
            field_errors,
            stats.duration_seconds
        );

        stats
    }

    /// Loops until `shutdown` flips to true. A running cycle always finishes
    /// before the loop exits.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Scheduler started: {} targets, interval {:?} ({}), watchdog {:?}",
            self.store.targets().len(),
            self.config.interval,
            self.config.policy.as_str(),
            self.config.watchdog
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            let started = Instant::now();
            self.run_cycle().await;

            let pause = self
                .config
                .policy
                .sleep_after(self.config.interval, started.elapsed());
            debug!("Sleeping for {:?}", pause);

            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Scheduler stopped after {} cycles", self.cycle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prober::ProbeOutput;

    struct ScriptedProber {
        stderr: &'static str,
    }

    impl Prober for ScriptedProber {
        async fn probe(
            &self,
            _targets: &[String],
            _settings: &ProbeSettings,
        ) -> Result<ProbeOutput, ProbeError> {
            Ok(ProbeOutput {
                stdout: String::new(),
                stderr: self.stderr.to_string(),
                exit_code: Some(1),
            })
        }
    }

    struct FailingProber;

    impl Prober for FailingProber {
        async fn probe(
            &self,
            _targets: &[String],
            _settings: &ProbeSettings,
        ) -> Result<ProbeOutput, ProbeError> {
            Err(ProbeError::NotFound("fping".to_string()))
        }
    }

    fn store() -> Arc<MetricStore> {
        Arc::new(MetricStore::new(vec![
            "8.8.8.8".to_string(),
            "8.8.4.4".to_string(),
            "1.1.1.1".to_string(),
        ]))
    }

    #[test]
    fn test_sleep_policy() {
        let interval = Duration::from_secs(5);
        let elapsed = Duration::from_secs(2);
        assert_eq!(SchedulePolicy::Fixed.sleep_after(interval, elapsed), interval);
        assert_eq!(
            SchedulePolicy::Periodic.sleep_after(interval, elapsed),
            Duration::from_secs(3)
        );
        assert_eq!(
            SchedulePolicy::Periodic.sleep_after(interval, Duration::from_secs(9)),
            Duration::ZERO
        );
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("Periodic".parse::<SchedulePolicy>().unwrap(), SchedulePolicy::Periodic);
        assert_eq!("fixed".parse::<SchedulePolicy>().unwrap(), SchedulePolicy::Fixed);
        assert!("sometimes".parse::<SchedulePolicy>().is_err());
    }

    #[tokio::test]
    async fn test_cycle_publishes_parsed_results() {
        let store = store();
        let health = Arc::new(HealthStats::new());
        let prober = ScriptedProber {
            stderr: "1.1.1.1 : xmt/rcv/%loss = 10/10/0%, min/avg/max = 10.0/12.5/15.0\n\
                     8.8.8.8 : xmt/rcv/%loss = 10/5/50%, min/avg/max = 1.0/2.0/3.0\n",
        };
        let mut scheduler =
            Scheduler::new(prober, store.clone(), health.clone(), SchedulerConfig::default());

        let stats = scheduler.run_cycle().await;
        assert!(stats.success);
        assert_eq!(stats.cycle, 1);

        let snap = store.read();
        assert_eq!(snap.len(), 3);
        assert_eq!(snap.get("1.1.1.1").map(|r| r.avg_latency_ms), Some(12.5));
        assert_eq!(snap.get("8.8.8.8").map(|r| r.received), Some(5));
        assert!(snap.get("8.8.4.4").is_some_and(|r| r.is_default()));
        assert_eq!(store.loop_stats().cycle, 1);
    }

    #[tokio::test]
    async fn test_probe_error_publishes_defaults() {
        let store = store();
        let health = Arc::new(HealthStats::new());
        let mut scheduler =
            Scheduler::new(FailingProber, store.clone(), health.clone(), SchedulerConfig::default());

        let stats = scheduler.run_cycle().await;
        assert!(!stats.success);
        let snap = store.read();
        assert_eq!(snap.len(), 3);
        assert!(snap.results.values().all(|r| r.is_default()));
        assert_eq!(snap.cycle, 1);
        assert_eq!(
            health.probe_errors.load(std::sync::atomic::Ordering::Relaxed),
            1
        );
    }
}
