//! Test command implementation.
//!
//! Runs live probe cycles against the configured targets and prints the
//! parsed results, without starting the HTTP server.

use serde::Serialize;
use std::time::Instant;

use fping_exporter::{parse_output, FpingProber, ProbeError, ProbeResult, Prober};

use crate::cli::ConfigFormat;
use crate::commands::render;
use crate::config::Config;

/// One target's result in command output.
#[derive(Serialize)]
pub(crate) struct TargetReport {
    pub target: String,
    #[serde(flatten)]
    pub result: ProbeResult,
}

#[derive(Serialize)]
struct CycleReport {
    iteration: usize,
    duration_seconds: f64,
    field_errors: Vec<String>,
    results: Vec<TargetReport>,
}

/// Runs probe cycles and prints the results.
pub async fn command_test(
    iterations: usize,
    verbose: bool,
    format: ConfigFormat,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("🧪 fping Exporter - Test Mode");
    println!("============================");

    let targets = config.targets();
    let scheduler = config.scheduler_config()?;
    let settings = scheduler.settings;
    let prober = FpingProber;

    println!(
        "   🎯 {} targets, count {}, period {}ms, timeout {}ms",
        targets.len(),
        settings.count,
        settings.period_ms,
        settings.timeout_ms
    );

    for iteration in 1..=iterations {
        println!("\n🔄 Iteration {}/{}:", iteration, iterations);

        let start = Instant::now();
        let probe = prober.probe(&targets, &settings);
        let output = match tokio::time::timeout(scheduler.watchdog, probe).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                println!("   ❌ Probe failed: {}", e);
                return Err(e.into());
            }
            Err(_) => {
                let e = ProbeError::Timeout(scheduler.watchdog);
                println!("   ❌ {}", e);
                return Err(e.into());
            }
        };

        if verbose {
            println!("   📜 Raw output (exit code {:?}):", output.exit_code);
            for line in output.combined().lines() {
                println!("   │ {}", line);
            }
        }

        let parsed = parse_output(&output.combined(), &targets);
        let report = CycleReport {
            iteration,
            duration_seconds: start.elapsed().as_secs_f64(),
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
    }

    println!("\n✅ Test completed successfully");
    Ok(())
}
