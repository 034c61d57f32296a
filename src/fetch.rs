//! Sportradar HTTP client.
//!
//! One GET per endpoint group, with linear backoff on rate limits and
//! network failures. Any other non-200 status is fatal for the group
//! and is not retried.

use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::config::{ApiConfig, RetryConfig};
use crate::error::FetchError;

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    retry: RetryConfig,
}

impl ApiClient {
    pub fn new(api: &ApiConfig, retry: RetryConfig, api_key: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(api.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            api_key,
            retry,
        })
    }

    /// GET a JSON document from `path`. Attempt `n` (1-based) backs off
    /// `n * rate_limit_backoff_ms` after a 429/503 and
    /// `n * network_backoff_ms` after a network error. The API key
    /// travels as a query parameter and is never logged.
    pub async fn fetch(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Value, FetchError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));

        for attempt in 1..=self.retry.max_attempts {
            info!(%url, attempt, "GET");

            let request = self
                .http
                .get(&url)
                .query(&[("api_key", self.api_key.as_str())])
                .query(params);

            match request.send().await {
                Ok(resp) => {
                    let status = resp.status();

                    if status == reqwest::StatusCode::OK {
                        return resp.json::<Value>().await.map_err(|source| {
                            FetchError::Decode {
                                url: url.clone(),
                                source,
                            }
                        });
                    }

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS
                        || status == reqwest::StatusCode::SERVICE_UNAVAILABLE
                    {
                        let wait_ms =
                            u64::from(attempt) * self.retry.rate_limit_backoff_ms;
                        warn!(
                            status = status.as_u16(),
                            wait_ms,
                            "Rate-limited or service unavailable, backing off"
                        );
                        tokio::time::sleep(Duration::from_millis(wait_ms)).await;
                        continue;
                    }

                    let body = resp.text().await.unwrap_or_default();
                    let snippet: String = body.chars().take(200).collect();
                    error!(status = status.as_u16(), body = %snippet, "HTTP error");
                    return Err(FetchError::Fatal { url, status });
                }
                Err(e) => {
                    let wait_ms = u64::from(attempt) * self.retry.network_backoff_ms;
                    warn!(error = %e, wait_ms, "Request failed, backing off");
                    tokio::time::sleep(Duration::from_millis(wait_ms)).await;
                }
            }
        }

        Err(FetchError::RetriesExhausted {
            url,
            attempts: self.retry.max_attempts,
        })
    }
}
