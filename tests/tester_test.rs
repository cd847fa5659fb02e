//! End-to-end tests: dispatch, audit log correlation, statistics and reports

mod common;

use chrono::{Duration as ChronoDuration, Utc};
use std::io::Write;
use wafprobe::catalogue;
use wafprobe::error::WafProbeError;
use wafprobe::report;
use wafprobe::tester::WafTester;
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn server_blocking_first_xss() -> MockServer {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("message", "<script>alert('XSS')</script>"))
        .respond_with(ResponseTemplate::new(403))
        .with_priority(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    mock_server
}

#[tokio::test]
async fn test_unreachable_target_aborts_run() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = common::test_config("http://127.0.0.1:1", &dir.path().join("audit.log"));
    let tester = WafTester::new(config).expect("tester").with_progress(false);

    let err = tester
        .run(catalogue::all_cases())
        .await
        .expect_err("run should fail");
    assert!(matches!(err, WafProbeError::TargetUnreachable(_)));
}

#[tokio::test]
async fn test_missing_log_keeps_status_blocks() {
    let mock_server = server_blocking_first_xss().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let config = common::test_config(&mock_server.uri(), &dir.path().join("missing.log"));
    let tester = WafTester::new(config).expect("tester").with_progress(false);

    let report = tester.run(catalogue::all_cases()).await.expect("run");
    let stats = &report.stats;

    assert_eq!(stats.total_sent, 36);
    assert_eq!(stats.total_blocked, 1);
    assert_eq!(stats.total_missed, 35);
    assert_eq!(report.correlation.records_parsed, 0);
    assert_eq!(stats.category("xss").map(|s| s.blocked), Some(1));
    assert!(stats.top_rules.is_empty());
    // 36 payloads plus the connectivity probe
    assert_eq!(report.total_requests, 37);
}

#[tokio::test]
async fn test_full_run_correlates_audit_log() {
    let mock_server = server_blocking_first_xss().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let log_path = dir.path().join("modsec_audit.log");

    let future = Utc::now() + ChronoDuration::seconds(60);
    let stale = Utc::now() - ChronoDuration::seconds(3600);
    {
        let mut log = std::fs::File::create(&log_path).expect("create log");
        let lines = [
            // Percent-encoded: never matches the raw payload
            common::audit_line("/api/data?id=%27%20OR%20%271%27%3D%271", future, &["942100"]),
            // Raw URI: matches sql_001
            common::audit_line("/api/data?id=' OR '1'='1", future, &["942100", "949110"]),
            // Written before the run started
            common::audit_line("/api/data?cmd=| whoami", stale, &["932100"]),
            "{\"transaction\": {\"request\": ".to_string(),
            String::new(),
            "{\"producer\": {\"modsecurity\": \"3.0\"}}".to_string(),
            common::audit_line("/download?file=../../../etc/passwd", future, &["930100", "949110"]),
            // Same rule cited again for sql_001
            common::audit_line("/api/data?id=' OR '1'='1&page=2", future, &["942100"]),
        ];
        for line in lines {
            writeln!(log, "{line}").expect("write line");
        }
    }

    let config = common::test_config(&mock_server.uri(), &log_path);
    let tester = WafTester::new(config).expect("tester").with_progress(false);
    let report = tester.run(catalogue::all_cases()).await.expect("run");
    let stats = &report.stats;

    let sql_001 = report.results.iter().find(|r| r.id == "sql_001").expect("sql_001");
    assert!(sql_001.blocked);
    assert_eq!(sql_001.blocked_by_rules, vec!["942100", "949110"]);

    let cmd_002 = report.results.iter().find(|r| r.id == "cmd_002").expect("cmd_002");
    assert!(!cmd_002.blocked, "stale record must not be attributed");

    let path_001 = report.results.iter().find(|r| r.id == "path_001").expect("path_001");
    assert!(path_001.blocked);

    assert_eq!(report.correlation.malformed_lines, 1);
    assert_eq!(report.correlation.ignored_records, 1);
    assert_eq!(report.correlation.stale_records, 1);

    assert_eq!(stats.total_blocked + stats.total_missed, stats.total_sent);
    let sent: usize = stats.stats_by_type.iter().map(|(_, s)| s.sent).sum();
    assert_eq!(sent, stats.total_sent);
    assert!((0.0..=100.0).contains(&stats.detection_rate));

    let blocked_paths: Vec<&str> = report
        .results
        .iter()
        .filter(|r| r.attack_type == "path_traversal" && r.blocked)
        .map(|r| r.id.as_str())
        .collect();
    assert_eq!(blocked_paths, vec!["path_001"]);

    // 949110 is cited for both sql_001 and path_001; duplicates within sql_001 count once
    assert_eq!(stats.top_rules[0].rule_id, "949110");
    assert_eq!(stats.top_rules[0].count, 2);
    assert_eq!(stats.top_rules.len(), 3);
    assert!(stats.top_rules[1..].iter().all(|r| r.count == 1));
}

#[tokio::test]
async fn test_filtered_run_reports_zeroed_categories() {
    let mock_server = server_blocking_first_xss().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let config = common::test_config(&mock_server.uri(), &dir.path().join("audit.log"));
    let cases = catalogue::build(&config, &["xss".to_string()]);
    let tester = WafTester::new(config).expect("tester").with_progress(false);

    let report = tester.run(cases).await.expect("run");
    let stats = &report.stats;

    assert_eq!(stats.total_sent, 10);
    assert_eq!(stats.detection_rate, 10.0);
    let path = stats.category("path_traversal").expect("path_traversal entry");
    assert_eq!((path.sent, path.blocked, path.missed), (0, 0, 0));
    assert_eq!(path.detection_rate, 0.0);
}

#[tokio::test]
async fn test_reports_are_written() {
    let mock_server = server_blocking_first_xss().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let config = common::test_config(&mock_server.uri(), &dir.path().join("audit.log"));
    let cases = catalogue::build(&config, &["xss".to_string()]);
    let tester = WafTester::new(config).expect("tester").with_progress(false);
    let run_report = tester.run(cases).await.expect("run");

    let json_path = dir.path().join("report.json");
    let text_path = dir.path().join("report.txt");
    report::json::export(&run_report, &json_path).expect("json export");
    report::text::export(&run_report, &text_path).expect("text export");

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).expect("read json"))
            .expect("valid json");
    assert_eq!(json["summary"]["total_payloads"], 10);
    assert_eq!(json["summary"]["total_blocked"], 1);
    assert_eq!(json["summary"]["detection_rate"], 10.0);
    assert_eq!(json["by_attack_type"]["path_traversal"]["sent"], 0);
    assert_eq!(json["missed_attacks"].as_array().map(Vec::len), Some(9));
    assert_eq!(json["missed_attacks"][0]["status"], "200");

    let text = std::fs::read_to_string(&text_path).expect("read text");
    assert!(text.contains("WAF Test Report"));
    assert!(text.contains("PATH TRAVERSAL"));
    assert!(text.contains("MISSED ATTACKS (9)"));
}
