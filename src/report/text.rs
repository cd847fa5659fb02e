//! Plain-text report export

use crate::error::Result;
use crate::report::category_label;
use crate::tester::RunReport;
use chrono::Local;
use std::fmt::{self, Write};
use std::path::Path;
use tracing::info;

/// Number of missed attacks listed in the text report
const MISSED_LISTED: usize = 10;

/// Renders the plain-text report
pub fn render(report: &RunReport) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_report(&mut out, report);
    out
}

fn write_report(out: &mut impl Write, report: &RunReport) -> fmt::Result {
    let stats = &report.stats;
    let rule = "=".repeat(60);

    writeln!(out, "{rule}")?;
    writeln!(out, "WAF Test Report")?;
    writeln!(out, "{rule}\n")?;
    writeln!(out, "Date: {}", Local::now().format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(out, "Target: {}", report.target)?;
    writeln!(out, "Run: {}\n", report.run_id)?;

    writeln!(out, "SUMMARY:")?;
    writeln!(out, "├─ Sent: {} requests", stats.total_sent)?;
    writeln!(
        out,
        "├─ Blocked: {} requests ({:.1}%)",
        stats.total_blocked, stats.detection_rate
    )?;
    writeln!(
        out,
        "├─ Missed: {} requests ({:.1}%)",
        stats.total_missed,
        100.0 - stats.detection_rate
    )?;
    writeln!(out, "└─ Execution time: {:.2} s\n", stats.execution_time)?;

    writeln!(out, "BY ATTACK TYPE:")?;
    for (attack_type, s) in &stats.stats_by_type {
        writeln!(out, "├─ {}:", category_label(attack_type))?;
        writeln!(out, "│  ├─ Sent: {}", s.sent)?;
        writeln!(out, "│  ├─ Blocked: {} ({:.1}%)", s.blocked, s.detection_rate)?;
        writeln!(out, "│  └─ Missed: {}", s.missed)?;
    }

    writeln!(out, "\nTOP RULES:")?;
    for (idx, r) in stats.top_rules.iter().enumerate() {
        writeln!(out, "{:2}. Rule {}: {} hits", idx + 1, r.rule_id, r.count)?;
    }

    if !stats.missed_attacks.is_empty() {
        writeln!(out, "\nMISSED ATTACKS ({}):", stats.missed_attacks.len())?;
        for (idx, r) in stats.missed_attacks.iter().take(MISSED_LISTED).enumerate() {
            writeln!(out, "{}. {}: {}", idx + 1, r.attack_type, r.payload)?;
        }
    }

    Ok(())
}

/// Exports the run report as a plain-text file
pub fn export(report: &RunReport, output_path: &Path) -> Result<()> {
    std::fs::write(output_path, render(report))?;
    info!("Text report saved to {}", output_path.display());
    Ok(())
}
