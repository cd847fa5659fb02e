//! Console summary

use crate::report::{category_label, shorten, Rating};
use crate::stats::RunStatistics;
use crate::tester::RunReport;
use colored::{ColoredString, Colorize};
use tabled::builder::Builder;
use tabled::settings::Style;

/// Number of missed attacks shown on the console
const MISSED_SHOWN: usize = 5;

fn colored_rating(rating: Rating) -> ColoredString {
    let label = rating.to_string();
    match rating {
        Rating::Excellent => label.green().bold(),
        Rating::Good => label.yellow(),
        Rating::Fair => label.bright_red(),
        Rating::Critical => label.red().bold(),
    }
}

/// Builds the per-category table
pub fn category_table(stats: &RunStatistics) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Attack type", "Sent", "Blocked", "Missed", "Rate", ""]);

    for (attack_type, s) in &stats.stats_by_type {
        let mark = match s.missed {
            0 => "✓",
            1 => "⚠",
            _ => "✗",
        };
        builder.push_record([
            category_label(attack_type),
            s.sent.to_string(),
            s.blocked.to_string(),
            s.missed.to_string(),
            format!("{:.1}%", s.detection_rate),
            mark.to_string(),
        ]);
    }

    builder.push_record([
        "Total".to_string(),
        stats.total_sent.to_string(),
        stats.total_blocked.to_string(),
        stats.total_missed.to_string(),
        format!("{:.1}%", stats.detection_rate),
        String::new(),
    ]);

    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

/// Prints the run summary to stdout
pub fn print_report(report: &RunReport) {
    let stats = &report.stats;

    println!("\n{}", "  WAF Test Report".bold());
    println!("  {}", "─".repeat(45));

    println!(
        "  {} {}",
        "Sent:".bold(),
        format!("{} requests", stats.total_sent).cyan()
    );
    println!(
        "  {} {}",
        "Blocked:".bold(),
        format!(
            "{} requests ({:.1}%)",
            stats.total_blocked, stats.detection_rate
        )
        .green()
    );
    println!(
        "  {} {}",
        "Missed:".bold(),
        format!(
            "{} requests ({:.1}%)",
            stats.total_missed,
            100.0 - stats.detection_rate
        )
        .red()
    );
    println!(
        "  {} {}\n",
        "Rating:".bold(),
        colored_rating(Rating::from_rate(stats.detection_rate))
    );

    println!("{}", category_table(stats));

    if !stats.top_rules.is_empty() {
        println!("\n  {}", "Top triggered rules".bold());
        for (idx, r) in stats.top_rules.iter().enumerate() {
            println!(
                "  {:2}. Rule {} {}",
                idx + 1,
                r.rule_id.cyan(),
                format!("({} hits)", r.count).dimmed()
            );
        }
    }

    if !stats.missed_attacks.is_empty() {
        println!(
            "\n  {}",
            format!("Missed attacks ({})", stats.missed_attacks.len())
                .yellow()
                .bold()
        );
        for (idx, r) in stats.missed_attacks.iter().take(MISSED_SHOWN).enumerate() {
            println!("  {}. [{}] {}", idx + 1, r.attack_type, r.id);
            println!("     Payload:  {}", shorten(&r.payload, 60));
            println!("     Endpoint: {} (status {})", r.endpoint, r.outcome);
        }
    }

    println!(
        "\n  {} {:.2} s ({} HTTP requests)",
        "Execution time:".bold(),
        stats.execution_time,
        report.total_requests
    );
}
