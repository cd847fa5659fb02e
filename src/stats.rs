//! Run statistics
//!
//! Pure reduction from finished test results to a summary snapshot.

use crate::models::TestResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// Number of rules kept in the top-rules list
pub const TOP_RULES: usize = 10;

/// Sent/blocked/missed counts for one slice of results
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryStats {
    pub sent: usize,
    pub blocked: usize,
    pub missed: usize,
    /// Percentage of sent requests that were blocked, 0 when nothing was sent
    pub detection_rate: f64,
}

impl CategoryStats {
    fn from_results<'a>(results: impl Iterator<Item = &'a TestResult>) -> Self {
        let (sent, blocked) = results.fold((0, 0), |(sent, blocked), r| {
            (sent + 1, blocked + usize::from(r.blocked))
        });
        Self {
            sent,
            blocked,
            missed: sent - blocked,
            detection_rate: detection_rate(blocked, sent),
        }
    }
}

/// Hit count for a single firewall rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleCount {
    pub rule_id: String,
    pub count: usize,
}

/// Read-only summary of one run
#[derive(Debug, Clone, Serialize)]
pub struct RunStatistics {
    pub total_sent: usize,
    pub total_blocked: usize,
    pub total_missed: usize,
    pub detection_rate: f64,
    /// Per-category breakdown in configured order
    pub stats_by_type: Vec<(String, CategoryStats)>,
    /// Every rule seen, in first-encountered order
    pub rule_stats: Vec<RuleCount>,
    pub top_rules: Vec<RuleCount>,
    pub missed_attacks: Vec<TestResult>,
    /// Seconds between run start and end
    pub execution_time: f64,
}

impl RunStatistics {
    /// Looks up the breakdown for a category
    pub fn category(&self, attack_type: &str) -> Option<&CategoryStats> {
        self.stats_by_type
            .iter()
            .find(|(name, _)| name == attack_type)
            .map(|(_, stats)| stats)
    }
}

/// Percentage of `blocked` over `sent`, clamped to [0, 100]
pub fn detection_rate(blocked: usize, sent: usize) -> f64 {
    if sent == 0 {
        return 0.0;
    }
    (blocked as f64 / sent as f64 * 100.0).clamp(0.0, 100.0)
}

/// Computes run statistics.
///
/// `attack_types` fixes which categories appear in the breakdown and in what
/// order; a configured category with no results still gets a zeroed entry.
/// Categories present in the results but not configured are appended so the
/// breakdown always sums to the totals.
pub fn compute(
    results: &[TestResult],
    attack_types: &[String],
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
) -> RunStatistics {
    let overall = CategoryStats::from_results(results.iter());

    let mut categories: Vec<String> = Vec::with_capacity(attack_types.len());
    let configured = attack_types.iter();
    let observed = results.iter().map(|r| &r.attack_type);
    for attack_type in configured.chain(observed) {
        if !categories.contains(attack_type) {
            categories.push(attack_type.clone());
        }
    }

    let stats_by_type = categories
        .into_iter()
        .map(|attack_type| {
            let stats =
                CategoryStats::from_results(results.iter().filter(|r| r.attack_type == attack_type));
            (attack_type, stats)
        })
        .collect();

    let rule_stats = count_rules(results);
    let top_rules = top_rules(&rule_stats, TOP_RULES);

    let missed_attacks = results.iter().filter(|r| !r.blocked).cloned().collect();

    let execution_time = match (started_at, finished_at) {
        (Some(start), Some(end)) => (end - start).num_milliseconds() as f64 / 1000.0,
        _ => 0.0,
    };

    RunStatistics {
        total_sent: overall.sent,
        total_blocked: overall.blocked,
        total_missed: overall.missed,
        detection_rate: overall.detection_rate,
        stats_by_type,
        rule_stats,
        top_rules,
        missed_attacks,
        execution_time,
    }
}

/// Counts rule ids across results, keeping first-encountered order
pub fn count_rules(results: &[TestResult]) -> Vec<RuleCount> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<RuleCount> = Vec::new();

    for rule_id in results.iter().flat_map(|r| r.blocked_by_rules.iter()) {
        match index.get(rule_id.as_str()) {
            Some(&pos) => counts[pos].count += 1,
            None => {
                index.insert(rule_id.as_str(), counts.len());
                counts.push(RuleCount {
                    rule_id: rule_id.clone(),
                    count: 1,
                });
            }
        }
    }

    counts
}

/// Highest counts first; the stable sort keeps ties in first-encountered order
pub fn top_rules(rule_stats: &[RuleCount], limit: usize) -> Vec<RuleCount> {
    let mut sorted = rule_stats.to_vec();
    sorted.sort_by(|a, b| b.count.cmp(&a.count));
    sorted.truncate(limit);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue;
    use crate::models::{TestCase, TesterConfig, TransportOutcome};
    use chrono::Duration as ChronoDuration;
    use std::time::Duration;

    fn result_for(case: &TestCase, blocked: bool, rules: &[&str]) -> TestResult {
        let mut r = TestResult::from_case(case, TransportOutcome::Status(200), Duration::ZERO, Utc::now());
        if blocked {
            r.mark_blocked();
        }
        for rule in rules {
            r.add_rule(*rule);
        }
        r
    }

    fn categories() -> Vec<String> {
        TesterConfig::default().attack_types
    }

    #[test]
    fn test_empty_run() {
        let stats = compute(&[], &categories(), None, None);
        assert_eq!(stats.total_sent, 0);
        assert_eq!(stats.detection_rate, 0.0);
        assert_eq!(stats.execution_time, 0.0);
        assert_eq!(stats.stats_by_type.len(), 4);
        assert!(stats.top_rules.is_empty());
    }

    #[test]
    fn test_totals_and_breakdown_are_consistent() {
        let cases = catalogue::all_cases();
        let results: Vec<TestResult> = cases
            .iter()
            .enumerate()
            .map(|(i, c)| result_for(c, i % 3 == 0, &[]))
            .collect();

        let stats = compute(&results, &categories(), None, None);
        assert_eq!(stats.total_sent, 36);
        assert_eq!(stats.total_blocked + stats.total_missed, stats.total_sent);
        assert_eq!(stats.total_blocked, 12);
        assert_eq!(stats.missed_attacks.len(), 24);

        let sent: usize = stats.stats_by_type.iter().map(|(_, s)| s.sent).sum();
        let blocked: usize = stats.stats_by_type.iter().map(|(_, s)| s.blocked).sum();
        assert_eq!(sent, stats.total_sent);
        assert_eq!(blocked, stats.total_blocked);
        assert!((0.0..=100.0).contains(&stats.detection_rate));
        assert!((stats.detection_rate - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_sent_category_still_reported() {
        let results: Vec<TestResult> = catalogue::cases_by_type("sql_injection")
            .iter()
            .map(|c| result_for(c, true, &["942100"]))
            .collect();

        let stats = compute(&results, &categories(), None, None);
        let path = stats.category("path_traversal").expect("path_traversal entry");
        assert_eq!(*path, CategoryStats::default());

        let sql = stats.category("sql_injection").expect("sql entry");
        assert_eq!(sql.sent, 10);
        assert_eq!(sql.detection_rate, 100.0);
    }

    #[test]
    fn test_duplicate_configured_categories_collapse() {
        let results: Vec<TestResult> = catalogue::cases_by_type("xss")
            .iter()
            .map(|c| result_for(c, false, &[]))
            .collect();
        let configured = vec!["xss".to_string(), "sql_injection".to_string(), "xss".to_string()];

        let stats = compute(&results, &configured, None, None);
        let names: Vec<&str> = stats.stats_by_type.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["xss", "sql_injection"]);

        let sent: usize = stats.stats_by_type.iter().map(|(_, s)| s.sent).sum();
        assert_eq!(sent, stats.total_sent);
    }

    #[test]
    fn test_unconfigured_category_is_appended() {
        let case = TestCase {
            id: "ssrf_001".to_string(),
            attack_type: "ssrf".to_string(),
            payload: "http://169.254.169.254/".to_string(),
            endpoint: "/fetch".to_string(),
            method: "GET".to_string(),
            parameter: "url".to_string(),
            description: String::new(),
        };
        let stats = compute(&[result_for(&case, false, &[])], &categories(), None, None);
        assert_eq!(stats.stats_by_type.len(), 5);
        assert_eq!(stats.stats_by_type[4].0, "ssrf");
        assert_eq!(stats.category("ssrf").map(|s| s.missed), Some(1));
    }

    #[test]
    fn test_top_rules_order_and_ties() {
        let cases = catalogue::all_cases();
        let results = vec![
            result_for(&cases[0], true, &["b", "a"]),
            result_for(&cases[1], true, &["c", "a"]),
            result_for(&cases[2], true, &["c", "d"]),
        ];
        let stats = compute(&results, &categories(), None, None);

        let ids: Vec<&str> = stats.top_rules.iter().map(|r| r.rule_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c", "b", "d"]);
        assert_eq!(stats.top_rules[0].count, 2);
        assert_eq!(stats.rule_stats[0].rule_id, "b");
    }

    #[test]
    fn test_top_rules_truncated() {
        let cases = catalogue::all_cases();
        let results: Vec<TestResult> = cases
            .iter()
            .take(15)
            .enumerate()
            .map(|(i, c)| {
                let own = format!("9{i:05}");
                result_for(c, true, &[own.as_str(), "949110"])
            })
            .collect();

        let stats = compute(&results, &categories(), None, None);
        assert_eq!(stats.rule_stats.len(), 16);
        assert_eq!(stats.top_rules.len(), TOP_RULES);
        assert_eq!(stats.top_rules[0].rule_id, "949110");
        assert_eq!(stats.top_rules[0].count, 15);
        assert_eq!(stats.top_rules[1].rule_id, "900000");
        assert!(stats
            .top_rules
            .windows(2)
            .all(|w| w[0].count >= w[1].count));
    }

    #[test]
    fn test_execution_time() {
        let start = Utc::now();
        let end = start + ChronoDuration::milliseconds(2500);
        let stats = compute(&[], &categories(), Some(start), Some(end));
        assert_eq!(stats.execution_time, 2.5);
        assert_eq!(compute(&[], &categories(), Some(start), None).execution_time, 0.0);
    }

    #[test]
    fn test_missed_list_keeps_order() {
        let cases = catalogue::all_cases();
        let results = vec![
            result_for(&cases[4], false, &[]),
            result_for(&cases[1], true, &[]),
            result_for(&cases[9], false, &[]),
        ];
        let stats = compute(&results, &categories(), None, None);
        let ids: Vec<&str> = stats.missed_attacks.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["sql_005", "sql_010"]);
    }
}
