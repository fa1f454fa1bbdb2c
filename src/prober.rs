//! Invocation of the external fping utility.
//!
//! One process is spawned per cycle for all targets. The prober only captures
//! text and exit status; interpreting the text is the parser's job.

use std::future::Future;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use serde::Serialize;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::ProbeError;

/// Extra headroom on top of fping's own worst-case runtime.
const WATCHDOG_MARGIN: Duration = Duration::from_secs(5);

/// Per-probe parameters passed to fping.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeSettings {
    /// fping binary name or path.
    pub binary: String,
    /// Packets per target (`-c`).
    pub count: u32,
    /// Milliseconds between packets to one target (`-p`).
    pub period_ms: u64,
    /// Per-packet timeout in milliseconds (`-t`).
    pub timeout_ms: u64,
    /// ICMP payload size in bytes (`-b`).
    pub payload_bytes: u32,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            binary: "fping".to_string(),
            count: 10,
            period_ms: 1500,
            timeout_ms: 500,
            payload_bytes: 56,
        }
    }
}

impl ProbeSettings {
    /// Command-line arguments for one batched invocation.
    pub fn args(&self, targets: &[String]) -> Vec<String> {
        let mut args = vec![
            "-q".to_string(),
            "-c".to_string(),
            self.count.to_string(),
            "-p".to_string(),
            self.period_ms.to_string(),
            "-t".to_string(),
            self.timeout_ms.to_string(),
            "-b".to_string(),
            self.payload_bytes.to_string(),
        ];
        args.extend(targets.iter().cloned());
        args
    }

    /// Lower bound for the cycle watchdog: per-packet timeout times count.
    pub fn minimum_watchdog(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.saturating_mul(u64::from(self.count)))
    }

    /// Worst-case fping runtime for one cycle.
    pub fn expected_runtime(&self) -> Duration {
        let per_packet = self.period_ms.max(self.timeout_ms);
        let runtime = per_packet
            .saturating_mul(u64::from(self.count))
            .saturating_add(self.timeout_ms);
        Duration::from_millis(runtime)
    }

    /// Worst-case fping runtime plus a margin.
    pub fn default_watchdog(&self) -> Duration {
        self.expected_runtime() + WATCHDOG_MARGIN
    }
}

/// Raw text captured from one invocation.
#[derive(Debug, Clone, Default)]
pub struct ProbeOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl ProbeOutput {
    /// stderr followed by stdout. fping writes its summaries to stderr.
    pub fn combined(&self) -> String {
        let mut text = String::with_capacity(self.stderr.len() + self.stdout.len() + 1);
        text.push_str(&self.stderr);
        if !self.stderr.is_empty() && !self.stderr.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&self.stdout);
        text
    }

    pub fn is_empty(&self) -> bool {
        self.stdout.trim().is_empty() && self.stderr.trim().is_empty()
    }
}

/// Something that can run one batched probe.
pub trait Prober: Send + Sync {
    fn probe(
        &self,
        targets: &[String],
        settings: &ProbeSettings,
    ) -> impl Future<Output = Result<ProbeOutput, ProbeError>> + Send;
}

/// Resolves the configured binary on PATH (or as a path).
pub fn resolve_binary(binary: &str) -> Result<PathBuf, ProbeError> {
    which::which(binary).map_err(|e| ProbeError::NotFound(format!("{binary} ({e})")))
}

/// Runs the real fping binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct FpingProber;

impl Prober for FpingProber {
    async fn probe(
        &self,
        targets: &[String],
        settings: &ProbeSettings,
    ) -> Result<ProbeOutput, ProbeError> {
        let binary = resolve_binary(&settings.binary)?;
        let args = settings.args(targets);
        debug!("Running {} {}", binary.display(), args.join(" "));

        let output = Command::new(&binary)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => ProbeError::NotFound(settings.binary.clone()),
                _ => ProbeError::Spawn {
                    binary: settings.binary.clone(),
                    source: e,
                },
            })?;

        let probe_output = ProbeOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        };

        match probe_output.exit_code {
            Some(0) => debug!("fping finished: all targets reachable"),
            Some(1) => debug!("fping finished: some targets unreachable"),
            Some(code) => warn!("fping exited with status {}", code),
            None if probe_output.is_empty() => return Err(ProbeError::Killed),
            None => warn!("fping terminated by signal, parsing partial output"),
        }

        Ok(probe_output)
    }
}
