//! Check-requirements command implementation.
//!
//! Validates the fping binary and the effective configuration.

use crate::config::{validate_effective_config, Config};
use crate::startup_checks;

/// Validates runtime requirements and configuration.
pub fn command_check_requirements(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Checking Runtime Requirements");
    println!("================================\n");

    let mut all_ok = true;

    // Check fping binary
    let settings = config.probe_settings();
    println!("📡 Checking fping ({})...", settings.binary);
    match startup_checks::validate_requirements(&settings.binary) {
        Ok(_) => println!("   ✅ fping is available"),
        Err(e) => {
            println!("   ❌ {}", e);
            all_ok = false;
        }
    }

    // Check configuration
    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(_) => {
            println!("   ✅ Configuration is valid");
            if let Ok(sched) = config.scheduler_config() {
                println!(
                    "   ✅ {} targets, interval {}s ({}), watchdog {:.1}s",
                    config.targets().len(),
                    sched.interval.as_secs(),
                    sched.policy.as_str(),
                    sched.watchdog.as_secs_f64()
                );
            }
        }
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All requirements met - ready for production!");
        Ok(())
    } else {
        println!("   ❌ Some checks failed - please review warnings");
        std::process::exit(1);
    }
}
