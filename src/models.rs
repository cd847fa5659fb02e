//! Core data models for wafprobe

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// HTTP status codes the firewall answers with when it rejects a request
pub const BLOCKING_STATUSES: [u16; 3] = [403, 406, 418];

/// Sentinel rule id used when a log message carries details but no rule id
pub const UNKNOWN_RULE: &str = "unknown";

/// A single attack payload bound to an endpoint and parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    /// Unique identifier within a run (e.g. `sql_001`)
    pub id: String,
    /// Attack category (e.g. `sql_injection`)
    pub attack_type: String,
    /// Raw payload string, sent unmodified as the parameter value
    pub payload: String,
    /// Path appended to the target base URL
    pub endpoint: String,
    /// HTTP method
    pub method: String,
    /// Query parameter that carries the payload
    pub parameter: String,
    /// Human readable description
    pub description: String,
}

/// How a dispatched request ended at the transport layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum TransportOutcome {
    /// The server answered with this status code
    Status(u16),
    /// The request exceeded the configured timeout
    Timeout,
    /// The connection could not be established
    ConnectionError,
    /// Any other transport failure
    Error(String),
}

impl TransportOutcome {
    /// Returns the HTTP status code if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportOutcome::Status(code) => Some(*code),
            _ => None,
        }
    }

    /// Returns true if the status code is one the firewall uses to reject requests
    pub fn is_blocking_status(&self) -> bool {
        self.status()
            .is_some_and(|code| BLOCKING_STATUSES.contains(&code))
    }
}

impl fmt::Display for TransportOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportOutcome::Status(code) => write!(f, "{code}"),
            TransportOutcome::Timeout => write!(f, "TIMEOUT"),
            TransportOutcome::ConnectionError => write!(f, "CONNECTION_ERROR"),
            TransportOutcome::Error(msg) => write!(f, "ERROR: {msg}"),
        }
    }
}

/// Outcome of one dispatched test case, enriched later by log correlation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub id: String,
    pub attack_type: String,
    pub payload: String,
    pub endpoint: String,
    /// Blocked by status code or by a matching audit log record
    pub blocked: bool,
    /// Rule ids cited by matching log records, deduplicated, in first-seen order
    pub blocked_by_rules: Vec<String>,
    pub outcome: TransportOutcome,
    pub latency_ms: u64,
    pub sent_at: DateTime<Utc>,
}

impl TestResult {
    /// Records the transport outcome of a test case.
    /// A blocking status code marks the result as blocked immediately.
    pub fn from_case(
        case: &TestCase,
        outcome: TransportOutcome,
        latency: Duration,
        sent_at: DateTime<Utc>,
    ) -> Self {
        let blocked = outcome.is_blocking_status();
        Self {
            id: case.id.clone(),
            attack_type: case.attack_type.clone(),
            payload: case.payload.clone(),
            endpoint: case.endpoint.clone(),
            blocked,
            blocked_by_rules: Vec::new(),
            outcome,
            latency_ms: u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
            sent_at,
        }
    }

    /// Marks the result as blocked; calling it again is a no-op
    pub fn mark_blocked(&mut self) {
        self.blocked = true;
    }

    /// Appends a rule id unless it is already recorded
    pub fn add_rule(&mut self, rule_id: impl Into<String>) {
        let rule_id = rule_id.into();
        if !self.blocked_by_rules.contains(&rule_id) {
            self.blocked_by_rules.push(rule_id);
        }
    }
}

/// Configuration for a test run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TesterConfig {
    /// Base URL of the protected target
    pub target: String,
    /// Path to the firewall's JSON audit log
    pub log_file: PathBuf,
    /// Number of dispatch workers
    pub concurrency: usize,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Delay inserted between dispatches in milliseconds
    pub delay_ms: u64,
    /// Wait before reading the audit log, in seconds
    pub grace_secs: u64,
    /// User-Agent header value
    pub user_agent: String,
    /// Attack categories reported on, in display order
    pub attack_types: Vec<String>,
    /// Endpoints test cases may target
    pub endpoints: Vec<String>,
    /// Whether to write the JSON and text reports
    pub save_results: bool,
    pub json_report: PathBuf,
    pub text_report: PathBuf,
}

impl TesterConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_secs)
    }
}

impl Default for TesterConfig {
    fn default() -> Self {
        Self {
            target: "http://192.168.1.25".to_string(),
            log_file: PathBuf::from("/var/log/modsecurity/modsec_audit.log"),
            concurrency: 5,
            timeout_secs: 10,
            delay_ms: 100,
            grace_secs: 2,
            user_agent: "wafprobe/0.1.0".to_string(),
            attack_types: vec![
                "sql_injection".to_string(),
                "xss".to_string(),
                "command_injection".to_string(),
                "path_traversal".to_string(),
            ],
            endpoints: vec!["/api/data".to_string(), "/download".to_string()],
            save_results: true,
            json_report: PathBuf::from("waf_test_report.json"),
            text_report: PathBuf::from("waf_test_report.txt"),
        }
    }
}
