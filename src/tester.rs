//! Test run orchestration
//!
//! connectivity check -> dispatch -> grace delay -> log correlation -> statistics

use crate::correlator::{CorrelationSummary, LogCorrelator};
use crate::dispatcher::Dispatcher;
use crate::error::Result;
use crate::http::HttpClient;
use crate::models::{TestCase, TestResult, TesterConfig};
use crate::stats::{self, RunStatistics};
use chrono::{DateTime, Utc};
use tokio::time::sleep;
use tracing::info;

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: String,
    pub target: String,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub total_requests: u64,
    pub results: Vec<TestResult>,
    pub correlation: CorrelationSummary,
    pub stats: RunStatistics,
}

/// Runs one full WAF test against the configured target
pub struct WafTester {
    config: TesterConfig,
    client: HttpClient,
    show_progress: bool,
}

impl WafTester {
    pub fn new(config: TesterConfig) -> Result<Self> {
        let client = HttpClient::from_config(&config)?;
        info!("Target: {}", config.target);
        info!("Audit log: {}", config.log_file.display());
        Ok(Self {
            config,
            client,
            show_progress: true,
        })
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Fails with `TargetUnreachable` if the target does not answer at all
    pub async fn check_connection(&self) -> Result<u16> {
        let status = self.client.check_connection().await?;
        info!("Connection OK (status {status})");
        Ok(status)
    }

    /// Executes the whole run for the given test cases
    pub async fn run(&self, cases: Vec<TestCase>) -> Result<RunReport> {
        self.check_connection().await?;

        let dispatcher =
            Dispatcher::new(self.client.clone(), &self.config).with_progress(self.show_progress);
        let mut run = dispatcher.dispatch(cases).await;

        // The firewall may write its audit record after the response is sent.
        let grace = self.config.grace_period();
        info!("Waiting {grace:?} for the audit log to catch up");
        sleep(grace).await;

        let correlator = LogCorrelator::new(&self.config);
        let correlation = correlator.correlate(&mut run.results, run.started_at);

        let stats = stats::compute(
            &run.results,
            &self.config.attack_types,
            run.started_at,
            run.finished_at,
        );

        info!(
            "Run finished: {}/{} blocked ({:.1}%)",
            stats.total_blocked, stats.total_sent, stats.detection_rate
        );

        Ok(RunReport {
            run_id: uuid::Uuid::new_v4().to_string(),
            target: self.config.target.clone(),
            started_at: run.started_at,
            finished_at: run.finished_at,
            total_requests: self.client.request_count(),
            results: run.results,
            correlation,
            stats,
        })
    }
}
