//! JSON report export

use crate::error::Result;
use crate::tester::RunReport;
use chrono::Local;
use serde_json::{json, Map, Value};
use std::path::Path;
use tracing::info;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Builds the JSON document for a finished run
pub fn build(report: &RunReport) -> Value {
    let stats = &report.stats;

    let by_attack_type: Map<String, Value> = stats
        .stats_by_type
        .iter()
        .map(|(attack_type, s)| {
            (
                attack_type.clone(),
                json!({
                    "sent": s.sent,
                    "blocked": s.blocked,
                    "missed": s.missed,
                    "detection_rate": round2(s.detection_rate),
                }),
            )
        })
        .collect();

    let top_rules: Vec<Value> = stats
        .top_rules
        .iter()
        .map(|r| json!({ "rule_id": r.rule_id, "count": r.count }))
        .collect();

    let missed_attacks: Vec<Value> = stats
        .missed_attacks
        .iter()
        .map(|r| {
            json!({
                "id": r.id,
                "type": r.attack_type,
                "payload": r.payload,
                "endpoint": r.endpoint,
                "status": r.outcome.to_string(),
            })
        })
        .collect();

    json!({
        "timestamp": Local::now().to_rfc3339(),
        "run_id": report.run_id,
        "target": report.target,
        "summary": {
            "total_payloads": stats.total_sent,
            "total_blocked": stats.total_blocked,
            "total_missed": stats.total_missed,
            "detection_rate": round2(stats.detection_rate),
            "execution_time": round2(stats.execution_time),
            "total_requests": report.total_requests,
        },
        "by_attack_type": by_attack_type,
        "top_rules": top_rules,
        "missed_attacks": missed_attacks,
    })
}

/// Exports the run report as a JSON file
pub fn export(report: &RunReport, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(&build(report))?;
    std::fs::write(output_path, json)?;
    info!("JSON report saved to {}", output_path.display());
    Ok(())
}
