//! Audit log correlation
//!
//! Matches firewall audit records back to dispatched test cases. A record
//! matches a result when the result's raw payload is a substring of the
//! logged request URI. The URI is not percent-decoded first, so a payload the
//! client encoded on the wire will not match. This is a known approximation
//! and is kept as-is.

pub mod parser;

use crate::models::{TestResult, TesterConfig};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub use parser::{parse_line, parse_lines, LogParseError, LogRecord, RuleHit};

/// Counters describing one correlation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorrelationSummary {
    /// Lines that produced a record
    pub records_parsed: usize,
    /// Lines that were not valid JSON
    pub malformed_lines: usize,
    /// Valid JSON lines without a transaction
    pub ignored_records: usize,
    /// Records dropped because they predate the run
    pub stale_records: usize,
    /// Records that matched at least one result
    pub matched_records: usize,
}

/// Reads the audit log and enriches test results with blocks and rule ids
pub struct LogCorrelator {
    log_file: PathBuf,
}

impl LogCorrelator {
    pub fn new(config: &TesterConfig) -> Self {
        Self::with_log_file(&config.log_file)
    }

    pub fn with_log_file(path: impl AsRef<Path>) -> Self {
        Self {
            log_file: path.as_ref().to_path_buf(),
        }
    }

    /// Correlates the audit log against `results` in place.
    ///
    /// A missing or unreadable log leaves the results untouched.
    pub fn correlate(
        &self,
        results: &mut [TestResult],
        run_start: Option<DateTime<Utc>>,
    ) -> CorrelationSummary {
        info!("Reading audit log {}", self.log_file.display());

        let bytes = match std::fs::read(&self.log_file) {
            Ok(b) => b,
            Err(e) => {
                warn!(
                    "Audit log {} unavailable, skipping correlation: {e}",
                    self.log_file.display()
                );
                return CorrelationSummary::default();
            }
        };

        let text = String::from_utf8_lossy(&bytes);
        let summary = correlate_text(&text, results, run_start);

        info!(
            "Parsed {} audit records ({} malformed, {} without transaction, {} stale), {} matched",
            summary.records_parsed,
            summary.malformed_lines,
            summary.ignored_records,
            summary.stale_records,
            summary.matched_records
        );
        summary
    }
}

/// Parses log text and applies every usable record to `results`
pub fn correlate_text(
    text: &str,
    results: &mut [TestResult],
    run_start: Option<DateTime<Utc>>,
) -> CorrelationSummary {
    let mut summary = CorrelationSummary::default();

    for parsed in parse_lines(text) {
        let record = match parsed {
            Ok(record) => record,
            Err(LogParseError::Json(e)) => {
                debug!("Skipping malformed audit line: {e}");
                summary.malformed_lines += 1;
                continue;
            }
            Err(LogParseError::MissingTransaction) => {
                summary.ignored_records += 1;
                continue;
            }
        };
        summary.records_parsed += 1;

        if is_stale(&record, run_start) {
            summary.stale_records += 1;
            continue;
        }

        if apply_record(&record, results) > 0 {
            summary.matched_records += 1;
        }
    }

    summary
}

/// True when the record has a readable timestamp strictly before the run start
pub fn is_stale(record: &LogRecord, run_start: Option<DateTime<Utc>>) -> bool {
    match (record.timestamp, run_start) {
        (Some(ts), Some(start)) => ts < start,
        _ => false,
    }
}

/// Whether a record's URI contains the result's raw payload
pub fn record_matches(record: &LogRecord, result: &TestResult) -> bool {
    record.uri.contains(result.payload.as_str())
}

/// Marks every matching result blocked and merges the record's rule ids.
/// Returns the number of results matched.
pub fn apply_record(record: &LogRecord, results: &mut [TestResult]) -> usize {
    let mut matched = 0;
    for result in results.iter_mut().filter(|r| record_matches(record, r)) {
        result.mark_blocked();
        for hit in &record.rules {
            result.add_rule(hit.rule_id.as_str());
        }
        matched += 1;
    }
    matched
}
