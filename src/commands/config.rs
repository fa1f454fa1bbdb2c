//! Config command implementation.
//!
//! Generates configuration files in various formats.

use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use crate::config::{render_config, Config};

/// Generates configuration files.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    let output = match output {
        Some(path) => path,
        None => PathBuf::from("fping-exporter.yaml"),
    };

    let mut content = render_config(&config, &format)?;
    if commented && matches!(format, ConfigFormat::Yaml) {
        content = add_config_comments(content);
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Adds comments to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# fping Exporter Configuration
# ============================
#
# Server Configuration
# --------------------
# bind: "0.0.0.0"              # Bind IP (0.0.0.0 = all interfaces)
# port: 8000                   # HTTP port
# enable_health: true          # Enable /health endpoint
#
# Targets and Scheduling
# ----------------------
# targets:                     # Hosts probed each cycle (unique, non-empty)
#   - 8.8.8.8
#   - 8.8.4.4
#   - 1.1.1.1
# interval_seconds: 1          # Pause between cycles
# schedule: fixed              # fixed: sleep full interval after each cycle
#                              # periodic: sleep interval minus cycle duration
# watchdog_seconds: null       # Abort a probe after N seconds
#                              # (null = count * max(period, timeout) + timeout + 5s;
#                              #  must exceed timeout_ms * count)
#
# fping Parameters
# ----------------
# fping_path: fping            # Binary name on PATH or absolute path
# count: 10                    # Packets per target per cycle (-c)
# period_ms: 1500              # Time between packets to one target (-p)
# timeout_ms: 500              # Per-packet timeout (-t)
# payload_bytes: 56            # ICMP payload size (-b)
#
# Logging
# -------
# log_level: "info"            # off, error, warn, info, debug, trace
# log_file: null               # Also append logs to this file
#
# TLS/SSL Configuration
# ---------------------
# enable_tls: false            # Enable HTTPS (default: false)
# tls_cert_path: null          # Path to TLS certificate (PEM format)
# tls_key_path: null           # Path to TLS private key (PEM format)
"#;

    format!("{comments}\n{yaml}")
}
