//! Common test utilities

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use serde_json::json;
use std::path::Path;
use wafprobe::models::TesterConfig;

/// Creates a test TesterConfig pointing to a wiremock server
pub fn test_config(target: &str, log_file: &Path) -> TesterConfig {
    TesterConfig {
        target: target.to_string(),
        log_file: log_file.to_path_buf(),
        concurrency: 4,
        timeout_secs: 5,
        delay_ms: 0,
        grace_secs: 0,
        user_agent: "wafprobe-test/0.1.0".to_string(),
        save_results: false,
        ..TesterConfig::default()
    }
}

/// Renders one ModSecurity-style JSON audit line
pub fn audit_line(uri: &str, timestamp: DateTime<Utc>, rule_ids: &[&str]) -> String {
    let messages: Vec<serde_json::Value> = rule_ids
        .iter()
        .map(|id| json!({ "message": "Matched rule", "details": { "ruleId": id, "severity": "2" } }))
        .collect();

    json!({
        "transaction": {
            "client_ip": "10.0.0.5",
            "timestamp": timestamp.to_rfc3339(),
            "request": { "method": "GET", "uri": uri },
            "response": { "http_code": 200 },
            "messages": messages,
        }
    })
    .to_string()
}
