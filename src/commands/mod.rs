//! CLI command implementations for fping-exporter.
//!
//! This module provides implementations for all CLI subcommands:
//! - `check-requirements`: fping and configuration validation
//! - `config`: Configuration file generation
//! - `test`: Live probe cycles without the HTTP server
//! - `parse`: Offline parsing of saved fping output

pub mod check;
pub mod config;
pub mod parse;
pub mod test;

// Re-export command functions
pub use check::command_check_requirements;
pub use config::command_config;
pub use parse::command_parse;
pub use test::command_test;

use crate::cli::ConfigFormat;
use serde::Serialize;

/// Serializes command output in the requested format.
pub(crate) fn render<T: Serialize>(
    value: &T,
    format: &ConfigFormat,
) -> Result<String, Box<dyn std::error::Error>> {
    Ok(match format {
        ConfigFormat::Json => serde_json::to_string_pretty(value)?,
        ConfigFormat::Toml => toml::to_string_pretty(value)?,
        ConfigFormat::Yaml => serde_yaml::to_string(value)?,
    })
}
