//! CLI arguments and subcommands for fping-exporter.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use std::net::IpAddr;
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Configuration format options for output
#[derive(Debug, Clone, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "fping-exporter",
    about = "Prometheus exporter for fping latency and packet-loss statistics",
    long_about = "Prometheus exporter for fping latency and packet-loss statistics.\n\n\
                  Runs fping against a fixed list of targets on an interval and exposes \
                  per-target min/avg/max latency, packet loss and packet counts. Targets \
                  without a successful measurement report loss=100 and latency=-1.",
    version,
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// HTTP listen port
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Bind to specific interface/IP
    #[arg(long)]
    pub bind: Option<IpAddr>,

    /// Log level (overrides log_level from the config file)
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Also write logs to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// Targets to probe (comma-separated, overrides config)
    #[arg(short = 't', long)]
    pub targets: Option<String>,

    /// Seconds between collection cycles
    #[arg(short = 'i', long)]
    pub interval: Option<u64>,

    /// Sleep policy between cycles
    #[arg(long, value_parser = ["fixed", "periodic"])]
    pub schedule: Option<String>,

    /// Packets sent to each target per cycle (fping -c)
    #[arg(long)]
    pub count: Option<u32>,

    /// Milliseconds between packets to one target (fping -p)
    #[arg(long)]
    pub period_ms: Option<u64>,

    /// Per-packet timeout in milliseconds (fping -t)
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// ICMP payload size in bytes (fping -b)
    #[arg(long)]
    pub payload_bytes: Option<u32>,

    /// fping binary name or path
    #[arg(long)]
    pub fping_path: Option<String>,

    /// Cycle watchdog in seconds (must exceed timeout x count)
    #[arg(long)]
    pub watchdog_seconds: Option<u64>,

    /// Disable /health endpoint
    #[arg(long)]
    pub disable_health: bool,

    /// Enable TLS/SSL for HTTPS
    #[arg(long)]
    pub enable_tls: bool,

    /// Path to TLS certificate file (PEM format)
    #[arg(long)]
    pub tls_cert: Option<PathBuf>,

    /// Path to TLS private key file (PEM format)
    #[arg(long)]
    pub tls_key: Option<PathBuf>,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate configuration files
    Config {
        /// Output file path ("-" for stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments and examples
        #[arg(long)]
        commented: bool,
    },

    /// Run probe cycles once and print the results
    Test {
        /// Number of cycles
        #[arg(short = 'n', long, default_value_t = 1)]
        iterations: usize,

        /// Show raw fping output
        #[arg(long)]
        verbose: bool,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,
    },

    /// Parse saved fping output (file or stdin) for the configured targets
    Parse {
        /// File containing fping output ("-" or omitted for stdin)
        input: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,
    },

    /// Check runtime requirements (fping binary and permissions)
    CheckRequirements,
}
