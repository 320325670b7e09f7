use std::time::Duration;

use async_trait::async_trait;
use backoff::{backoff::Backoff, ExponentialBackoff};
use tracing::debug;

use crate::error::{Error, Result};
use crate::throttle::{make_limiter, Cooldown, Limiter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Exactly one of these comes back per submitted request. `NoReply` models a
/// request that could not even be dispatched; the caller clears its busy flag
/// and moves on without surfacing an error.
#[derive(Debug)]
pub enum FetchOutcome {
    Completed(Vec<u8>),
    Failed(String),
    NoReply,
}

/// Seam to the HTTP session layer. Models never see the client underneath,
/// only single-shot request outcomes.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn submit(&self, method: Method, path: &str, params: &[(String, String)]) -> FetchOutcome;
}

/// Rate-limited reqwest transport against the public JSON endpoints.
///
/// Retrying a 429 with bounded backoff is internal to one logical fetch; any
/// other failure is reported once and never retried here.
pub struct RedditTransport {
    client: reqwest::Client,
    base_url: String,
    limiter: Limiter,
    cooldown: Cooldown,
    attempts: u32,
    backoff_initial_ms: u64,
    backoff_max_ms: u64,
}

impl RedditTransport {
    pub fn new(base_url: &str, rpm: u32, user_agent: &str, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Error::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            limiter: make_limiter(rpm),
            cooldown: Cooldown::default(),
            attempts: 3,
            backoff_initial_ms: 800,
            backoff_max_ms: 5000,
        })
    }
}

#[async_trait]
impl Transport for RedditTransport {
    async fn submit(&self, method: Method, path: &str, params: &[(String, String)]) -> FetchOutcome {
        let url = format!("{}{}.json", self.base_url, path);

        let mut eb = ExponentialBackoff {
            current_interval: Duration::from_millis(self.backoff_initial_ms),
            initial_interval: Duration::from_millis(self.backoff_initial_ms),
            max_interval: Duration::from_millis(self.backoff_max_ms),
            max_elapsed_time: Some(Duration::from_secs(15)),
            ..ExponentialBackoff::default()
        };

        for attempt in 0..self.attempts {
            self.cooldown.gate(&self.limiter).await;

            let req = match method {
                Method::Get => self.client.get(&url),
                Method::Post => self.client.post(&url),
            };
            let req = req.query(params).query(&[("raw_json", "1")]);

            match req.send().await {
                Ok(resp) if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS => {
                    let sleep = eb.next_backoff().unwrap_or(Duration::from_millis(1200));
                    debug!(
                        url,
                        attempt = attempt + 1,
                        backoff_ms = sleep.as_millis() as u64,
                        "rate limited"
                    );
                    self.cooldown.extend_secs(20 + u64::from(attempt) * 10);
                    tokio::time::sleep(sleep).await;
                }
                Ok(resp) => {
                    let status = resp.status();
                    if !status.is_success() {
                        return FetchOutcome::Failed(format!("HTTP {status} for {url}"));
                    }
                    return match resp.bytes().await {
                        Ok(bytes) => FetchOutcome::Completed(bytes.to_vec()),
                        Err(e) => FetchOutcome::Failed(e.to_string()),
                    };
                }
                // the request never left this process
                Err(e) if e.is_builder() => return FetchOutcome::NoReply,
                Err(e) => return FetchOutcome::Failed(e.to_string()),
            }
        }

        FetchOutcome::Failed(format!(
            "gave up after {} rate-limit retries: {url}",
            self.attempts
        ))
    }
}
