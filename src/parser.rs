//! Parser for fping summary output.
//!
//! fping in quiet mode (`-q -c N`) prints one summary line per target:
//!
//! ```text
//! 1.1.1.1  : xmt/rcv/%loss = 10/10/0%, min/avg/max = 10.0/12.5/15.0
//! 8.8.4.4  : xmt/rcv/%loss = 10/0/100%
//! ```
//!
//! Lines are classified by the marker tokens they contain, never by their
//! position in the output. Every configured target starts with the sentinel
//! record, so a target that never shows up keeps loss 100 and latency -1.

use ahash::AHashMap as HashMap;
use tracing::{debug, trace};

use crate::error::{FieldKind, ParseFieldError};
use crate::snapshot::{default_results, ProbeResult};

/// Marker for the sent/received/loss field.
pub const LOSS_MARKER: &str = "xmt/rcv/%loss";

/// Marker for the min/avg/max latency field.
pub const LATENCY_MARKER: &str = "min/avg/max";

/// Parsed results plus the field errors encountered along the way.
#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    pub results: HashMap<String, ProbeResult>,
    pub field_errors: Vec<ParseFieldError>,
}

/// Parses fping output into one record per configured target.
///
/// Never fails: malformed fields are reported in `field_errors` and leave the
/// affected values at their defaults. Lines for unknown targets are skipped.
pub fn parse_output(text: &str, targets: &[String]) -> ParseOutcome {
    let mut results = default_results(targets);
    let mut field_errors = Vec::new();

    for line in text.lines() {
        let has_loss = line.contains(LOSS_MARKER);
        let has_latency = line.contains(LATENCY_MARKER);
        if !has_loss && !has_latency {
            trace!("Ignoring line: {}", line);
            continue;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        // IPv6 targets may end in ':', so try the raw token first
        let target = match tokens.first() {
            Some(&token) if results.contains_key(token) => token,
            Some(&token) => token.strip_suffix(':').unwrap_or(token),
            None => continue,
        };

        let entry = match results.get_mut(target) {
            Some(entry) => entry,
            None => {
                debug!("Ignoring summary for unconfigured target '{}'", target);
                continue;
            }
        };

        if has_loss {
            match parse_loss_field(target, &tokens) {
                Ok((sent, received, loss_pct)) => {
                    entry.sent = sent;
                    entry.received = received;
                    entry.loss_pct = loss_pct;
                }
                Err(e) => field_errors.push(e),
            }
        }

        if has_latency {
            match parse_latency_field(target, &tokens) {
                Ok((min, avg, max)) => {
                    entry.min_latency_ms = min;
                    entry.avg_latency_ms = avg;
                    entry.max_latency_ms = max;
                }
                Err(e) => field_errors.push(e),
            }
        }
    }

    ParseOutcome {
        results,
        field_errors,
    }
}

/// Convenience wrapper that drops the field errors.
pub fn parse_fping_output(text: &str, targets: &[String]) -> HashMap<String, ProbeResult> {
    parse_output(text, targets).results
}

/// Returns the value token following `marker`, skipping the `=` separator.
fn field_after<'a>(tokens: &[&'a str], marker: &str) -> Option<&'a str> {
    let pos = tokens.iter().position(|t| t.starts_with(marker))?;
    tokens[pos + 1..].iter().copied().find(|t| *t != "=")
}

/// Splits a `a/b/c` field into exactly three components, stripping `,` and `%`.
fn split_triple(
    target: &str,
    kind: FieldKind,
    tokens: &[&str],
    marker: &str,
) -> Result<[String; 3], ParseFieldError> {
    let raw = field_after(tokens, marker).ok_or_else(|| ParseFieldError::Missing {
        target: target.to_string(),
        kind,
    })?;

    let cleaned = raw.replace([',', '%'], "");
    let parts: Vec<&str> = cleaned.split('/').collect();
    match parts.as_slice() {
        [a, b, c] => Ok([a.to_string(), b.to_string(), c.to_string()]),
        _ => Err(ParseFieldError::ComponentCount {
            target: target.to_string(),
            kind,
            found: parts.len(),
        }),
    }
}

fn invalid(target: &str, kind: FieldKind, value: &str) -> ParseFieldError {
    ParseFieldError::InvalidValue {
        target: target.to_string(),
        kind,
        value: value.to_string(),
    }
}

fn parse_count(target: &str, value: &str) -> Result<u64, ParseFieldError> {
    value
        .parse::<u64>()
        .map_err(|_| invalid(target, FieldKind::SentReceivedLoss, value))
}

fn parse_loss_field(target: &str, tokens: &[&str]) -> Result<(u64, u64, f64), ParseFieldError> {
    let kind = FieldKind::SentReceivedLoss;
    let [sent, received, loss] = split_triple(target, kind, tokens, LOSS_MARKER)?;

    let sent_n = parse_count(target, &sent)?;
    let received_n = parse_count(target, &received)?;
    let loss_pct = loss
        .parse::<f64>()
        .ok()
        .filter(|v| (0.0..=100.0).contains(v))
        .ok_or_else(|| invalid(target, kind, &loss))?;

    Ok((sent_n, received_n, loss_pct))
}

fn parse_latency_field(target: &str, tokens: &[&str]) -> Result<(f64, f64, f64), ParseFieldError> {
    let kind = FieldKind::MinAvgMax;
    let values = split_triple(target, kind, tokens, LATENCY_MARKER)?;

    let mut parsed = [0.0f64; 3];
    for (slot, value) in parsed.iter_mut().zip(values.iter()) {
        *slot = value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .ok_or_else(|| invalid(target, kind, value))?;
    }

    Ok((parsed[0], parsed[1], parsed[2]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targets(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_field_after_skips_equals() {
        let tokens = vec!["1.1.1.1", ":", "xmt/rcv/%loss", "=", "10/10/0%,"];
        assert_eq!(field_after(&tokens, LOSS_MARKER), Some("10/10/0%,"));
    }

    #[test]
    fn test_field_after_missing_value() {
        let tokens = vec!["1.1.1.1", ":", "xmt/rcv/%loss", "="];
        assert_eq!(field_after(&tokens, LOSS_MARKER), None);
    }

    #[test]
    fn test_loss_line_without_latency() {
        let out = parse_output(
            "8.8.8.8 : xmt/rcv/%loss = 10/0/100%\n",
            &targets(&["8.8.8.8"]),
        );
        let r = out.results["8.8.8.8"];
        assert_eq!(r.sent, 10);
        assert_eq!(r.received, 0);
        assert_eq!(r.loss_pct, 100.0);
        assert_eq!(r.avg_latency_ms, -1.0);
        assert!(out.field_errors.is_empty());
    }

    #[test]
    fn test_component_count_error() {
        let out = parse_output(
            "8.8.8.8 : xmt/rcv/%loss = 10/10, min/avg/max = 1.0/2.0/3.0\n",
            &targets(&["8.8.8.8"]),
        );
        let r = out.results["8.8.8.8"];
        assert_eq!((r.sent, r.received, r.loss_pct), (0, 0, 100.0));
        // The latency field on the same line is still used.
        assert_eq!(r.max_latency_ms, 3.0);
        assert_eq!(
            out.field_errors,
            vec![ParseFieldError::ComponentCount {
                target: "8.8.8.8".to_string(),
                kind: FieldKind::SentReceivedLoss,
                found: 2,
            }]
        );
    }

    #[test]
    fn test_negative_latency_rejected() {
        let out = parse_output(
            "1.1.1.1 : xmt/rcv/%loss = 1/1/0%, min/avg/max = -3.0/2.0/3.0\n",
            &targets(&["1.1.1.1"]),
        );
        let r = out.results["1.1.1.1"];
        assert_eq!(r.min_latency_ms, -1.0);
        assert_eq!(r.avg_latency_ms, -1.0);
        assert_eq!(r.sent, 1);
        assert_eq!(out.field_errors.len(), 1);
    }

    #[test]
    fn test_loss_out_of_range_rejected() {
        let out = parse_output(
            "1.1.1.1 : xmt/rcv/%loss = 10/10/250%\n",
            &targets(&["1.1.1.1"]),
        );
        assert!(out.results["1.1.1.1"].is_default());
        assert_eq!(out.field_errors[0].target(), "1.1.1.1");
    }

    #[test]
    fn test_unknown_target_ignored() {
        let out = parse_output(
            "9.9.9.9 : xmt/rcv/%loss = 10/10/0%, min/avg/max = 1.0/2.0/3.0\n",
            &targets(&["1.1.1.1"]),
        );
        assert_eq!(out.results.len(), 1);
        assert!(out.results["1.1.1.1"].is_default());
    }

    #[test]
    fn test_noise_lines_ignored() {
        let text = "ICMP Host Unreachable from 10.0.0.1 for ICMP Echo sent to 8.8.8.8\n\
                    8.8.8.8: error while sending ping: No route to host\n\
                    \n";
        let out = parse_output(text, &targets(&["8.8.8.8"]));
        assert!(out.results["8.8.8.8"].is_default());
        assert!(out.field_errors.is_empty());
    }
}
