//! fping exporter library.
//!
//! Runs the external `fping` utility against a fixed target list, parses its
//! summary output into typed per-target statistics, and keeps the latest
//! complete snapshot in a store that an HTTP layer can read concurrently.
//!
//! # Usage
//!
//! ```rust
//! use fping_exporter::parse_fping_output;
//!
//! let targets = vec!["1.1.1.1".to_string(), "8.8.4.4".to_string()];
//! let output = "1.1.1.1 : xmt/rcv/%loss = 10/10/0%, min/avg/max = 10.0/12.5/15.0\n";
//!
//! let results = parse_fping_output(output, &targets);
//! assert_eq!(results["1.1.1.1"].avg_latency_ms, 12.5);
//!
//! // No line for 8.8.4.4: the sentinel record applies.
//! assert_eq!(results["8.8.4.4"].loss_pct, 100.0);
//! assert_eq!(results["8.8.4.4"].min_latency_ms, -1.0);
//! ```

pub mod error;
pub mod health_stats;
pub mod parser;
pub mod prober;
pub mod scheduler;
pub mod snapshot;
pub mod store;

// Re-export main types for convenience
pub use error::{ConfigError, FieldKind, ParseFieldError, ProbeError};
pub use health_stats::HealthStats;
pub use parser::{parse_fping_output, parse_output, ParseOutcome};
pub use prober::{FpingProber, ProbeOutput, ProbeSettings, Prober};
pub use scheduler::{SchedulePolicy, Scheduler, SchedulerConfig};
pub use snapshot::{LoopStats, MetricSnapshot, ProbeResult};
pub use store::MetricStore;
