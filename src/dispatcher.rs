//! Concurrent payload dispatch
//!
//! A fixed pool of worker tasks drains a shared job channel and reports each
//! finished test case on a completion channel. The pool is joined before
//! `dispatch` returns, so callers never observe a partially written result.

use crate::http::HttpClient;
use crate::models::{TestCase, TestResult, TesterConfig};
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Results of a dispatch pass plus its wall-clock bounds
#[derive(Debug, Clone)]
pub struct DispatchRun {
    /// One result per test case, in completion order
    pub results: Vec<TestResult>,
    /// Instant the first request was handed to the pool
    pub started_at: Option<DateTime<Utc>>,
    /// Instant the last result arrived
    pub finished_at: Option<DateTime<Utc>>,
}

/// Sends test cases against the target with bounded concurrency
pub struct Dispatcher {
    client: HttpClient,
    concurrency: usize,
    delay: Duration,
    show_progress: bool,
}

impl Dispatcher {
    pub fn new(client: HttpClient, config: &TesterConfig) -> Self {
        Self {
            client,
            concurrency: config.concurrency.max(1),
            delay: config.delay(),
            show_progress: true,
        }
    }

    /// Enables or disables the terminal progress bar
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Dispatches every test case and waits for the whole pool to drain
    pub async fn dispatch(&self, cases: Vec<TestCase>) -> DispatchRun {
        let total = cases.len();
        if total == 0 {
            info!("No test cases to dispatch");
            return DispatchRun {
                results: Vec::new(),
                started_at: None,
                finished_at: None,
            };
        }

        info!(
            "Dispatching {total} test cases with {} workers",
            self.concurrency
        );

        let pb = self.progress_bar(total);

        let (job_tx, job_rx) = mpsc::channel::<TestCase>(self.concurrency);
        let job_rx = Arc::new(Mutex::new(job_rx));
        let (result_tx, mut result_rx) = mpsc::unbounded_channel::<TestResult>();

        let mut workers = JoinSet::new();
        for worker_id in 0..self.concurrency {
            let client = self.client.clone();
            let jobs = Arc::clone(&job_rx);
            let results = result_tx.clone();
            workers.spawn(run_worker(worker_id, client, jobs, results));
        }
        drop(result_tx);

        let started_at = Utc::now();
        let delay = self.delay;

        let feeder = async move {
            for (idx, case) in cases.into_iter().enumerate() {
                if idx > 0 && !delay.is_zero() {
                    sleep(delay).await;
                }
                if job_tx.send(case).await.is_err() {
                    warn!("All dispatch workers exited before the queue was drained");
                    break;
                }
            }
        };

        let collector = async {
            let mut collected = Vec::with_capacity(total);
            let mut last_arrival = None;
            while let Some(result) = result_rx.recv().await {
                last_arrival = Some(Utc::now());
                collected.push(result);
                pb.inc(1);
            }
            (collected, last_arrival)
        };

        let ((), (results, finished_at)) = tokio::join!(feeder, collector);

        // Barrier: no worker may still be running once correlation starts.
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(handled) => debug!("Worker finished after {handled} cases"),
                Err(e) => error!("Dispatch worker panicked: {e}"),
            }
        }

        pb.finish_with_message("Dispatch complete");

        if results.len() != total {
            warn!(
                "Collected {} results for {total} test cases",
                results.len()
            );
        }

        DispatchRun {
            results,
            started_at: Some(started_at),
            finished_at,
        }
    }

    fn progress_bar(&self, total: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  {spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {elapsed} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message("Sending payloads...");
        pb
    }
}

/// Pulls test cases off the shared queue until it closes
async fn run_worker(
    worker_id: usize,
    client: HttpClient,
    jobs: Arc<Mutex<mpsc::Receiver<TestCase>>>,
    results: mpsc::UnboundedSender<TestResult>,
) -> usize {
    let mut handled = 0;
    loop {
        let next = jobs.lock().await.recv().await;
        let Some(case) = next else {
            break;
        };

        let delivery = client.send_case(&case).await;
        let result =
            TestResult::from_case(&case, delivery.outcome, delivery.latency, delivery.sent_at);

        if results.send(result).is_err() {
            warn!("Worker {worker_id}: result channel closed");
            break;
        }
        handled += 1;
    }
    debug!("Worker {worker_id} drained");
    handled
}
