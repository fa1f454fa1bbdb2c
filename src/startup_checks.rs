//! Startup requirement validation for fping-exporter.
//!
//! This module validates that the fping binary is present and usable
//! before the collection loop starts.

use std::fs;
use std::path::Path;
use std::process::Command;
use tracing::{debug, error, info, warn};

use fping_exporter::prober::resolve_binary;

/// Validate all runtime requirements
pub fn validate_requirements(fping: &str) -> Result<(), ValidationError> {
    info!("🔍 Validating runtime requirements...");

    let path = check_fping_present(fping)?;
    check_fping_permissions(&path)?;
    check_fping_version(&path);

    info!("✅ All runtime requirements validated");
    Ok(())
}

/// Check that fping resolves on PATH (or as a path)
fn check_fping_present(fping: &str) -> Result<std::path::PathBuf, ValidationError> {
    match resolve_binary(fping) {
        Ok(path) => {
            info!("✅ fping found: {}", path.display());
            Ok(path)
        }
        Err(e) => {
            error!("❌ fping binary not found: {}", e);
            error!("   Solutions:");
            error!("   1. Install fping (apt install fping / dnf install fping)");
            error!("   2. Set fping_path in the config file or pass --fping-path");
            Err(ValidationError::FpingNotFound(fping.to_string()))
        }
    }
}

/// Check that fping may open raw ICMP sockets
fn check_fping_permissions(path: &Path) -> Result<(), ValidationError> {
    use std::os::unix::fs::PermissionsExt;

    match fs::metadata(path) {
        Ok(metadata) => {
            let mode = metadata.permissions().mode();
            if mode & 0o111 == 0 {
                error!("❌ {} is not executable", path.display());
                return Err(ValidationError::NotExecutable(path.display().to_string()));
            }
            if mode & 0o4000 != 0 {
                info!("✅ fping is setuid");
            } else {
                warn!("⚠️  fping is not setuid - probes need root or cap_net_raw");
                warn!("   Solution: setcap cap_net_raw+ep {}", path.display());
                // Not an error - capabilities are not visible in the mode bits
            }
            Ok(())
        }
        Err(e) => {
            warn!("⚠️  Could not inspect {}: {}", path.display(), e);
            Ok(())
        }
    }
}

/// Log the fping version, if it reports one
fn check_fping_version(path: &Path) {
    match Command::new(path).arg("-v").output() {
        Ok(output) => {
            let text = String::from_utf8_lossy(&output.stdout);
            let text = if text.trim().is_empty() {
                String::from_utf8_lossy(&output.stderr)
            } else {
                text
            };
            debug!("fping version: {}", text.lines().next().unwrap_or("unknown"));
        }
        Err(e) => {
            warn!("⚠️  Could not run {} -v: {}", path.display(), e);
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("fping binary not found: {0}")]
    FpingNotFound(String),

    #[error("fping binary is not executable: {0}")]
    NotExecutable(String),
}
