//! HTTP client wrapper with request counting and transport error classification

use crate::error::{Result, WafProbeError};
use crate::models::{TestCase, TesterConfig, TransportOutcome};
use chrono::{DateTime, Utc};
use reqwest::{Client, Method};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// What happened when a single test case was sent
#[derive(Debug, Clone)]
pub struct Delivery {
    pub outcome: TransportOutcome,
    pub latency: Duration,
    pub sent_at: DateTime<Utc>,
}

/// HTTP client wrapper shared by all dispatch workers
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    target: String,
    request_count: Arc<AtomicU64>,
}

impl HttpClient {
    /// Creates a new HttpClient from tester configuration.
    /// Redirects are never followed and certificate errors are ignored.
    pub fn from_config(config: &TesterConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::none())
            .danger_accept_invalid_certs(true)
            .build()?;

        Ok(Self {
            client,
            target: config.target.clone(),
            request_count: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Issues a plain GET against the target base URL.
    /// Any HTTP response counts as reachable; transport errors are fatal.
    pub async fn check_connection(&self) -> Result<u16> {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        let response = self
            .client
            .get(&self.target)
            .send()
            .await
            .map_err(|e| WafProbeError::TargetUnreachable(format!("{}: {e}", self.target)))?;
        Ok(response.status().as_u16())
    }

    /// Sends one test case with its payload in the named query parameter.
    /// Never fails: transport problems are folded into the returned outcome.
    pub async fn send_case(&self, case: &TestCase) -> Delivery {
        let url = self.endpoint_url(&case.endpoint);
        let sent_at = Utc::now();
        let start = Instant::now();

        let method = match Method::from_bytes(case.method.to_uppercase().as_bytes()) {
            Ok(m) => m,
            Err(e) => {
                warn!("Test case {} has invalid method '{}': {e}", case.id, case.method);
                return Delivery {
                    outcome: TransportOutcome::Error(format!("invalid method: {e}")),
                    latency: start.elapsed(),
                    sent_at,
                };
            }
        };

        self.request_count.fetch_add(1, Ordering::Relaxed);

        let sent = self
            .client
            .request(method, &url)
            .query(&[(case.parameter.as_str(), case.payload.as_str())])
            .send()
            .await;
        let latency = start.elapsed();

        let outcome = match sent {
            Ok(response) => {
                let status = response.status().as_u16();
                debug!("{} -> {status} in {latency:?}", case.id);
                TransportOutcome::Status(status)
            }
            Err(e) => {
                warn!("{} failed: {e}", case.id);
                classify_error(&e)
            }
        };

        Delivery {
            outcome,
            latency,
            sent_at,
        }
    }

    /// Builds the request URL for an endpoint by plain concatenation
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.target, endpoint)
    }

    /// Returns the total number of requests made
    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }
}

/// Maps a reqwest error to the transport outcome recorded on a result
pub fn classify_error(error: &reqwest::Error) -> TransportOutcome {
    if error.is_timeout() {
        TransportOutcome::Timeout
    } else if error.is_connect() {
        TransportOutcome::ConnectionError
    } else {
        TransportOutcome::Error(error.to_string())
    }
}
