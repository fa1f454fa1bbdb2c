//! Error taxonomy for the collector.
//!
//! Probe and parse errors are contained within a single collection cycle.
//! Configuration errors are fatal at startup.

use std::time::Duration;

/// Failure to run the external ping utility.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("ping utility not found: {0}")]
    NotFound(String),

    #[error("failed to spawn {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("ping utility did not finish within {0:?}")]
    Timeout(Duration),

    #[error("ping utility terminated by signal without output")]
    Killed,
}

/// Which marker a malformed field belonged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    SentReceivedLoss,
    MinAvgMax,
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldKind::SentReceivedLoss => write!(f, "xmt/rcv/%loss"),
            FieldKind::MinAvgMax => write!(f, "min/avg/max"),
        }
    }
}

/// A line matched a marker but its value field could not be used.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseFieldError {
    #[error("{kind} field missing for target {target}")]
    Missing { target: String, kind: FieldKind },

    #[error("{kind} field for target {target} has {found} components, expected 3")]
    ComponentCount {
        target: String,
        kind: FieldKind,
        found: usize,
    },

    #[error("{kind} field for target {target} has invalid value '{value}'")]
    InvalidValue {
        target: String,
        kind: FieldKind,
        value: String,
    },
}

impl ParseFieldError {
    pub fn target(&self) -> &str {
        match self {
            ParseFieldError::Missing { target, .. }
            | ParseFieldError::ComponentCount { target, .. }
            | ParseFieldError::InvalidValue { target, .. } => target,
        }
    }
}

/// Invalid startup configuration. The process refuses to serve.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no targets configured")]
    NoTargets,

    #[error("target list contains an empty entry")]
    EmptyTarget,

    #[error("target '{0}' is configured more than once")]
    DuplicateTarget(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("watchdog of {watchdog:?} must be greater than timeout x count ({minimum:?})")]
    WatchdogTooShort { watchdog: Duration, minimum: Duration },

    #[error("Invalid schedule '{0}', expected 'fixed' or 'periodic'")]
    InvalidSchedule(String),

    #[error("Invalid log_level '{0}'")]
    InvalidLogLevel(String),

    #[error("{0}")]
    Tls(String),
}
