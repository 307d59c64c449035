//! HTTP client for the lab endpoints.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode};
use serde_json::Value;
use tokio::sync::Semaphore;

/// Response from one lab call.
#[derive(Debug, Clone)]
pub struct LabResponse {
    pub status: StatusCode,
    pub body: Value,
    pub request_id: Option<String>,
    pub elapsed: Duration,
}

/// Outcome of a traffic burst.
#[derive(Debug, Default, Clone)]
pub struct BurstSummary {
    /// Responses per status code.
    pub statuses: BTreeMap<u16, usize>,
    /// Requests that never produced a response.
    pub transport_errors: usize,
    pub elapsed: Duration,
}

pub struct LabClient {
    client: Client,
    base_url: String,
}

impl LabClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn health(&self) -> Result<LabResponse, reqwest::Error> {
        self.get("/health", &[]).await
    }

    pub async fn hello(&self, delay_ms: u64) -> Result<LabResponse, reqwest::Error> {
        self.get("/hello", &[("delay_ms", delay_ms.to_string())]).await
    }

    pub async fn slow(&self, x: i64, cache: bool) -> Result<LabResponse, reqwest::Error> {
        let cache = if cache { "1" } else { "0" };
        self.get("/slow", &[("x", x.to_string()), ("cache", cache.to_string())])
            .await
    }

    pub async fn error(&self, rate: f64) -> Result<LabResponse, reqwest::Error> {
        self.get("/error", &[("rate", rate.to_string())]).await
    }

    /// Fire `requests` mixed calls with at most `concurrency` in flight.
    ///
    /// Traffic cycles through health, hello, cached slow and error calls.
    pub async fn burst(
        client: Arc<Self>,
        requests: usize,
        concurrency: usize,
        error_rate: f64,
    ) -> BurstSummary {
        let permits = Arc::new(Semaphore::new(concurrency.max(1)));
        let start = Instant::now();

        let mut handles = Vec::with_capacity(requests);
        for i in 0..requests {
            let client = client.clone();
            let permits = permits.clone();
            handles.push(tokio::spawn(async move {
                let _permit = permits.acquire_owned().await.ok()?;
                let result = match i % 4 {
                    0 => client.health().await,
                    1 => client.hello(10).await,
                    2 => client.slow((i % 16) as i64, true).await,
                    _ => client.error(error_rate).await,
                };
                result.ok().map(|r| r.status.as_u16())
            }));
        }

        let mut summary = BurstSummary::default();
        for handle in handles {
            match handle.await {
                Ok(Some(status)) => *summary.statuses.entry(status).or_default() += 1,
                _ => summary.transport_errors += 1,
            }
        }
        summary.elapsed = start.elapsed();
        summary
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<LabResponse, reqwest::Error> {
        let start = Instant::now();
        let resp = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .query(query)
            .send()
            .await?;

        let status = resp.status();
        let request_id = resp
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let text = resp.text().await?;
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));

        Ok(LabResponse {
            status,
            body,
            request_id,
            elapsed: start.elapsed(),
        })
    }
}
