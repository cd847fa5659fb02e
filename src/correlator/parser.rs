//! Audit log line parsing
//!
//! The firewall writes one JSON document per line. Only the fields needed for
//! correlation are extracted: `transaction.request.uri`,
//! `transaction.timestamp` and `transaction.messages[].details.ruleId`.

use crate::models::UNKNOWN_RULE;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Why a single log line could not be used
#[derive(Debug, Error)]
pub enum LogParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("record has no transaction")]
    MissingTransaction,
}

/// A rule citation inside an audit record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleHit {
    pub rule_id: String,
    pub message: Option<String>,
}

/// One audit record, reduced to what correlation needs
#[derive(Debug, Clone)]
pub struct LogRecord {
    /// Request URI exactly as logged (not decoded)
    pub uri: String,
    /// Transaction timestamp, `None` when missing or unreadable
    pub timestamp: Option<DateTime<Utc>>,
    pub rules: Vec<RuleHit>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    transaction: Option<RawTransaction>,
}

#[derive(Debug, Deserialize)]
struct RawTransaction {
    request: Option<Value>,
    timestamp: Option<Value>,
    messages: Option<Value>,
}

/// Parses a single audit log line
pub fn parse_line(line: &str) -> Result<LogRecord, LogParseError> {
    let entry: RawEntry = serde_json::from_str(line)?;
    let transaction = entry
        .transaction
        .ok_or(LogParseError::MissingTransaction)?;

    let uri = transaction
        .request
        .as_ref()
        .and_then(|r| r.get("uri"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let timestamp = transaction
        .timestamp
        .as_ref()
        .and_then(Value::as_str)
        .and_then(parse_timestamp);

    // Odd shapes under `messages` cost the rule ids, never the record
    let rules = transaction
        .messages
        .as_ref()
        .and_then(Value::as_array)
        .map(|messages| messages.iter().filter_map(rule_hit).collect())
        .unwrap_or_default();

    Ok(LogRecord {
        uri,
        timestamp,
        rules,
    })
}

/// Parses every non-blank line of a log, one result per line
pub fn parse_lines(text: &str) -> impl Iterator<Item = Result<LogRecord, LogParseError>> + '_ {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(parse_line)
}

fn rule_hit(message: &Value) -> Option<RuleHit> {
    let details = message.get("details")?.as_object()?;
    Some(RuleHit {
        rule_id: rule_id_from_details(details),
        message: message
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

fn rule_id_from_details(details: &Map<String, Value>) -> String {
    match details.get("ruleId") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => UNKNOWN_RULE.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Parses an ISO-8601 timestamp.
///
/// Offsets (including `Z`) are honoured; a timestamp without an offset is
/// read as local time, the clock the tester itself runs on.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|local| local.with_timezone(&Utc))
}
