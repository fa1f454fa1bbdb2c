//! Configuration management for fping-exporter.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use crate::cli::{Args, ConfigFormat};
use fping_exporter::{ConfigError, ProbeSettings, SchedulePolicy, SchedulerConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

// Default configuration constants
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_INTERVAL_SECONDS: u64 = 1;
pub const DEFAULT_TARGETS: [&str; 3] = ["8.8.8.8", "8.8.4.4", "1.1.1.1"];

const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

/// Exporter configuration. Every field is optional; `None` means "use the default".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub port: Option<u16>,
    pub bind: Option<String>,

    // Targets and scheduling
    pub targets: Option<Vec<String>>,
    #[serde(alias = "interval")]
    pub interval_seconds: Option<u64>,
    /// "fixed" | "periodic"
    pub schedule: Option<String>,
    #[serde(alias = "watchdog")]
    pub watchdog_seconds: Option<u64>,

    // fping parameters
    pub count: Option<u32>,
    pub period_ms: Option<u64>,
    pub timeout_ms: Option<u64>,
    pub payload_bytes: Option<u32>,
    #[serde(alias = "fping-path")]
    pub fping_path: Option<String>,

    // Feature flags
    pub enable_health: Option<bool>,

    // Logging
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,

    // TLS/SSL Configuration
    #[serde(alias = "enable-tls")]
    pub enable_tls: Option<bool>,
    #[serde(alias = "tls-cert-path")]
    pub tls_cert_path: Option<String>,
    #[serde(alias = "tls-key-path")]
    pub tls_key_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let probe = ProbeSettings::default();
        Self {
            bind: Some(DEFAULT_BIND_ADDR.to_string()),
            port: Some(DEFAULT_PORT),
            targets: Some(DEFAULT_TARGETS.iter().map(|t| t.to_string()).collect()),
            interval_seconds: Some(DEFAULT_INTERVAL_SECONDS),
            schedule: Some(SchedulePolicy::Fixed.as_str().to_string()),
            watchdog_seconds: None,
            count: Some(probe.count),
            period_ms: Some(probe.period_ms),
            timeout_ms: Some(probe.timeout_ms),
            payload_bytes: Some(probe.payload_bytes),
            fping_path: Some(probe.binary),
            enable_health: Some(true),
            log_level: Some("info".into()),
            log_file: None,
            enable_tls: Some(false),
            tls_cert_path: None,
            tls_key_path: None,
        }
    }
}

impl Config {
    /// Effective target list.
    pub fn targets(&self) -> Vec<String> {
        match &self.targets {
            Some(targets) => targets.iter().map(|t| t.trim().to_string()).collect(),
            None => DEFAULT_TARGETS.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// Effective fping parameters.
    pub fn probe_settings(&self) -> ProbeSettings {
        let defaults = ProbeSettings::default();
        ProbeSettings {
            binary: self.fping_path.clone().unwrap_or(defaults.binary),
            count: self.count.unwrap_or(defaults.count),
            period_ms: self.period_ms.unwrap_or(defaults.period_ms),
            timeout_ms: self.timeout_ms.unwrap_or(defaults.timeout_ms),
            payload_bytes: self.payload_bytes.unwrap_or(defaults.payload_bytes),
        }
    }

    /// Effective loop parameters. Call after validation.
    pub fn scheduler_config(&self) -> Result<SchedulerConfig, ConfigError> {
        let settings = self.probe_settings();
        let policy = match self.schedule.as_deref() {
            Some(s) => s.parse()?,
            None => SchedulePolicy::default(),
        };
        let watchdog = match self.watchdog_seconds {
            Some(secs) => Duration::from_secs(secs),
            None => settings.default_watchdog(),
        };
        Ok(SchedulerConfig {
            interval: Duration::from_secs(
                self.interval_seconds.unwrap_or(DEFAULT_INTERVAL_SECONDS),
            ),
            policy,
            watchdog,
            settings,
        })
    }
}

/// Describes a watchdog that is valid but shorter than a full fping run.
pub fn short_watchdog_warning(scheduler: &SchedulerConfig) -> Option<String> {
    let runtime = scheduler.settings.expected_runtime();
    if scheduler.watchdog >= runtime {
        return None;
    }
    Some(format!(
        "watchdog {:?} is shorter than the expected fping runtime {:?}; cycles will be cut short",
        scheduler.watchdog, runtime
    ))
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), ConfigError> {
    let targets = cfg.targets();
    if targets.is_empty() {
        return Err(ConfigError::NoTargets);
    }
    let mut seen = HashSet::new();
    for target in &targets {
        if target.is_empty() {
            return Err(ConfigError::EmptyTarget);
        }
        if !seen.insert(target.as_str()) {
            return Err(ConfigError::DuplicateTarget(target.clone()));
        }
    }

    if cfg.interval_seconds == Some(0) {
        return Err(ConfigError::Zero("interval_seconds"));
    }
    if cfg.count == Some(0) {
        return Err(ConfigError::Zero("count"));
    }
    if cfg.timeout_ms == Some(0) {
        return Err(ConfigError::Zero("timeout_ms"));
    }
    if cfg.period_ms == Some(0) {
        return Err(ConfigError::Zero("period_ms"));
    }

    let settings = cfg.probe_settings();
    if settings.binary.trim().is_empty() {
        return Err(ConfigError::Zero("fping_path length"));
    }

    // Parses the schedule and derives the watchdog
    let scheduler = cfg.scheduler_config()?;
    let minimum = settings.minimum_watchdog();
    if scheduler.watchdog <= minimum {
        return Err(ConfigError::WatchdogTooShort {
            watchdog: scheduler.watchdog,
            minimum,
        });
    }
    if let Some(message) = short_watchdog_warning(&scheduler) {
        warn!("{}", message);
    }

    if let Some(level) = cfg.log_level.as_deref() {
        if !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(level.to_string()));
        }
    }

    // TLS validation
    if cfg.enable_tls.unwrap_or(false) {
        let cert_path = cfg.tls_cert_path.as_deref();
        let key_path = cfg.tls_key_path.as_deref();

        match (cert_path, key_path) {
            (None, None) => {
                return Err(ConfigError::Tls(
                    "TLS is enabled but neither tls_cert_path nor tls_key_path are set".into(),
                ));
            }
            (Some(_), None) => {
                return Err(ConfigError::Tls(
                    "TLS is enabled but tls_key_path is not set".into(),
                ));
            }
            (None, Some(_)) => {
                return Err(ConfigError::Tls(
                    "TLS is enabled but tls_cert_path is not set".into(),
                ));
            }
            (Some(cert), Some(key)) => {
                check_pem_file(cert, "certificate")?;
                check_pem_file(key, "private key")?;
            }
        }
    }

    Ok(())
}

/// Checks that a TLS file exists, is readable and not empty.
fn check_pem_file(path: &str, what: &str) -> Result<(), ConfigError> {
    match fs::metadata(Path::new(path)) {
        Ok(meta) if meta.len() == 0 => Err(ConfigError::Tls(format!(
            "TLS {} file is empty: {}",
            what, path
        ))),
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ConfigError::Tls(format!(
            "TLS {} file not found: {}",
            what, path
        ))),
        Err(e) => Err(ConfigError::Tls(format!(
            "TLS {} file is not readable: {} ({})",
            what, path, e
        ))),
    }
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(bind_ip) = args.bind {
        config.bind = Some(bind_ip.to_string());
    }
    if let Some(cli_port) = args.port {
        config.port = Some(cli_port);
    }

    // Parse comma-separated targets
    if let Some(targets) = &args.targets {
        config.targets = Some(
            targets
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
        );
    }

    if let Some(interval) = args.interval {
        config.interval_seconds = Some(interval);
    }
    if let Some(schedule) = &args.schedule {
        config.schedule = Some(schedule.clone());
    }
    if let Some(watchdog) = args.watchdog_seconds {
        config.watchdog_seconds = Some(watchdog);
    }

    // fping parameters
    if let Some(count) = args.count {
        config.count = Some(count);
    }
    if let Some(period_ms) = args.period_ms {
        config.period_ms = Some(period_ms);
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.timeout_ms = Some(timeout_ms);
    }
    if let Some(payload_bytes) = args.payload_bytes {
        config.payload_bytes = Some(payload_bytes);
    }
    if let Some(path) = &args.fping_path {
        config.fping_path = Some(path.clone());
    }

    // Feature flags
    if args.disable_health {
        config.enable_health = Some(false);
    }

    // Logging
    if let Some(level) = &args.log_level {
        config.log_level = Some(format!("{:?}", level).to_ascii_lowercase());
    }
    if let Some(log_file) = &args.log_file {
        config.log_file = Some(log_file.clone());
    }

    // TLS configuration: CLI wins if provided
    if args.enable_tls {
        config.enable_tls = Some(true);
    }
    if let Some(cert_path) = &args.tls_cert {
        config.tls_cert_path = Some(cert_path.to_string_lossy().to_string());
    }
    if let Some(key_path) = &args.tls_key {
        config.tls_key_path = Some(key_path.to_string_lossy().to_string());
    }

    Ok(config)
}

/// Loads the config file from `path` or the first existing default location.
/// Missing files yield the default configuration.
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let defaults = [
                "/etc/fping-exporter/config.yaml",
                "/etc/fping-exporter/config.yml",
                "/etc/fping-exporter/config.json",
                "./fping-exporter.yaml",
                "./fping-exporter.yml",
                "./fping-exporter.json",
            ];

            match defaults.iter().find(|p| Path::new(p).exists()) {
                Some(p) => PathBuf::from(p),
                None => return Ok(Config::default()),
            }
        }
    };

    if !path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&path)?;

    match path.extension().and_then(|s| s.to_str()) {
        Some("json") => {
            let config: Config = serde_json::from_str(&content)?;
            info!("Loaded JSON configuration from: {}", path.display());
            Ok(config)
        }
        Some("toml") => {
            let config: Config = toml::from_str(&content)?;
            info!("Loaded TOML configuration from: {}", path.display());
            Ok(config)
        }
        _ => {
            // Default to YAML
            let config: Config = serde_yaml::from_str(&content)?;
            info!("Loaded YAML configuration from: {}", path.display());
            Ok(config)
        }
    }
}

/// Renders configuration in the requested format.
pub fn render_config(
    config: &Config,
    format: &ConfigFormat,
) -> Result<String, Box<dyn std::error::Error>> {
    Ok(match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    })
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", render_config(config, &format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = Config::default();
        assert!(validate_effective_config(&cfg).is_ok());
        assert_eq!(cfg.targets(), vec!["8.8.8.8", "8.8.4.4", "1.1.1.1"]);
        let sched = cfg.scheduler_config().unwrap();
        assert_eq!(sched.interval, Duration::from_secs(1));
        assert_eq!(sched.policy, SchedulePolicy::Fixed);
        assert!(sched.watchdog > cfg.probe_settings().minimum_watchdog());
    }

    #[test]
    fn test_duplicate_targets_rejected() {
        let cfg = Config {
            targets: Some(vec!["1.1.1.1".into(), " 1.1.1.1".into()]),
            ..Config::default()
        };
        assert!(matches!(
            validate_effective_config(&cfg),
            Err(ConfigError::DuplicateTarget(t)) if t == "1.1.1.1"
        ));
    }

    #[test]
    fn test_empty_target_list_rejected() {
        let cfg = Config {
            targets: Some(vec![]),
            ..Config::default()
        };
        assert!(matches!(
            validate_effective_config(&cfg),
            Err(ConfigError::NoTargets)
        ));
    }

    #[test]
    fn test_short_watchdog_rejected() {
        // timeout 500ms x count 10 = 5s, watchdog must exceed it
        let cfg = Config {
            watchdog_seconds: Some(5),
            ..Config::default()
        };
        assert!(matches!(
            validate_effective_config(&cfg),
            Err(ConfigError::WatchdogTooShort { .. })
        ));

        let cfg = Config {
            watchdog_seconds: Some(6),
            ..Config::default()
        };
        assert!(validate_effective_config(&cfg).is_ok());
    }

    #[test]
    fn test_invalid_schedule_rejected() {
        let cfg = Config {
            schedule: Some("hourly".into()),
            ..Config::default()
        };
        assert!(matches!(
            validate_effective_config(&cfg),
            Err(ConfigError::InvalidSchedule(_))
        ));
    }

    #[test]
    fn test_zero_count_rejected() {
        let cfg = Config {
            count: Some(0),
            ..Config::default()
        };
        assert!(matches!(
            validate_effective_config(&cfg),
            Err(ConfigError::Zero("count"))
        ));
    }

    #[test]
    fn test_load_yaml_config() {
        let mut file = Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "port: 9374\ntargets:\n  - 10.0.0.1\n  - 10.0.0.2\ncount: 5\nschedule: periodic"
        )
        .unwrap();

        let cfg = load_config(Some(file.path())).unwrap();
        assert_eq!(cfg.port, Some(9374));
        assert_eq!(cfg.targets(), vec!["10.0.0.1", "10.0.0.2"]);
        assert_eq!(cfg.probe_settings().count, 5);
        // Unset fields fall back to defaults
        assert_eq!(cfg.probe_settings().timeout_ms, 500);
        assert_eq!(
            cfg.scheduler_config().unwrap().policy,
            SchedulePolicy::Periodic
        );
    }

    #[test]
    fn test_load_json_config() {
        let mut file = Builder::new().suffix(".json").tempfile().unwrap();
        writeln!(file, r#"{{"targets": ["192.0.2.1"], "interval_seconds": 30}}"#).unwrap();

        let cfg = load_config(Some(file.path())).unwrap();
        assert_eq!(cfg.targets(), vec!["192.0.2.1"]);
        assert_eq!(
            cfg.scheduler_config().unwrap().interval,
            Duration::from_secs(30)
        );
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut file = Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "port: 9374\ncount: 5\ntargets: [10.0.0.1]").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let args = Args::parse_from([
            "fping-exporter",
            "--config",
            path.as_str(),
            "--port",
            "9100",
            "--targets",
            "1.1.1.1, 9.9.9.9",
        ]);
        let cfg = resolve_config(&args).unwrap();
        assert_eq!(cfg.port, Some(9100));
        assert_eq!(cfg.count, Some(5));
        assert_eq!(cfg.targets(), vec!["1.1.1.1", "9.9.9.9"]);
    }

    #[test]
    fn test_render_config_round_trips_yaml() {
        let cfg = Config::default();
        let yaml = render_config(&cfg, &ConfigFormat::Yaml).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.targets(), cfg.targets());
        assert_eq!(parsed.port, Some(DEFAULT_PORT));
    }

    #[test]
    fn test_short_watchdog_is_flagged() {
        let cfg = Config {
            watchdog_seconds: Some(6),
            ..Config::default()
        };
        assert!(validate_effective_config(&cfg).is_ok());
        let sched = cfg.scheduler_config().unwrap();
        assert!(short_watchdog_warning(&sched).is_some());

        let sched = Config::default().scheduler_config().unwrap();
        assert!(short_watchdog_warning(&sched).is_none());
    }
}
