//! Parse command implementation.
//!
//! Parses saved fping output for the configured targets. Useful for checking
//! what the exporter would publish for a captured run.

use anyhow::Context;
use serde::Serialize;
use std::io::Read;
use std::path::Path;

use fping_exporter::parse_output;

use crate::cli::ConfigFormat;
use crate::commands::render;
use crate::commands::test::TargetReport;
use crate::config::Config;

#[derive(Serialize)]
struct ParseReport {
    field_errors: Vec<String>,
    results: Vec<TargetReport>,
}

/// Reads fping output from `input` (or stdin) and prints the parsed results.
pub fn command_parse(
    input: Option<&Path>,
    format: ConfigFormat,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = read_input(input)?;
    let targets = config.targets();
    let parsed = parse_output(&text, &targets);

    let report = ParseReport {
        field_errors: parsed.field_errors.iter().map(|e| e.to_string()).collect(),
        results: targets
            .iter()
            .filter_map(|t| {
                parsed.results.get(t).map(|r| TargetReport {
                    target: t.clone(),
                    result: *r,
                })
            })
            .collect(),
    };

    println!("{}", render(&report, &format)?);
    Ok(())
}

fn read_input(input: Option<&Path>) -> anyhow::Result<String> {
    match input {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read fping output from {}", path.display())),
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read fping output from stdin")?;
            Ok(text)
        }
    }
}
