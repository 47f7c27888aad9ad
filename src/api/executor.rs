//! Rate-limited, retrying HTTP request execution.
//!
//! Every provider adapter funnels its calls through one `RequestExecutor`,
//! which applies the adapter's rate limiter, retries transport failures with
//! exponential backoff, and classifies HTTP error statuses into the shared
//! error taxonomy. Responses come back in a uniform `ApiResponse` envelope.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Client, Method};
use serde_json::{json, Value};
use tokio::sync::OnceCell;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::errors::ProviderError;
use super::rate_limiter::RateLimiter;

/// Standardized response envelope.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub data: Value,
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub response_time: Duration,
    pub cached: bool,
}

impl ApiResponse {
    pub fn success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Quota/usage counter from a response header, when numeric.
    pub fn header_u64(&self, name: &str) -> Option<u64> {
        self.headers.get(name).and_then(|v| v.parse().ok())
    }
}

pub struct RequestExecutor {
    base_url: String,
    default_headers: HeaderMap,
    timeout: Duration,
    max_retries: u32,
    rate_limiter: RateLimiter,
    // Session is created lazily on first use and reused for the adapter's
    // lifetime; reqwest drops the connection pool with the executor.
    client: OnceCell<Client>,
}

impl RequestExecutor {
    pub fn new(
        base_url: &str,
        default_headers: HeaderMap,
        timeout: Duration,
        max_retries: u32,
        rate_limiter: RateLimiter,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            default_headers,
            timeout,
            max_retries,
            rate_limiter,
            client: OnceCell::new(),
        }
    }

    async fn client(&self) -> Result<&Client, ProviderError> {
        self.client
            .get_or_try_init(|| async {
                Client::builder()
                    .timeout(self.timeout)
                    .default_headers(self.default_headers.clone())
                    .build()
                    .map_err(|e| ProviderError::Config(e.to_string()))
            })
            .await
    }

    /// Execute one logical request.
    ///
    /// Transport failures (connect, timeout, mid-body) are retried up to
    /// `max_retries` additional times with `2^attempt` second backoff. HTTP
    /// error statuses are classified and returned immediately, never retried.
    pub async fn execute(
        &self,
        method: Method,
        endpoint: &str,
        params: Option<&[(&str, &str)]>,
        body: Option<&Value>,
    ) -> Result<ApiResponse, ProviderError> {
        let url = format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'));
        let client = self.client().await?;
        let mut last_error = String::new();

        for attempt in 0..=self.max_retries {
            // Retries still count against the provider's rate budget.
            self.rate_limiter.acquire().await;

            let mut req = client.request(method.clone(), &url);
            if let Some(params) = params {
                req = req.query(params);
            }
            if let Some(body) = body {
                req = req.json(body);
            }

            let started = Instant::now();
            let outcome = async {
                let response = req.send().await?;
                let status_code = response.status().as_u16();
                let headers = response
                    .headers()
                    .iter()
                    .filter_map(|(name, value)| {
                        value
                            .to_str()
                            .ok()
                            .map(|v| (name.as_str().to_string(), v.to_string()))
                    })
                    .collect::<HashMap<_, _>>();
                let text = response.text().await?;
                Ok::<_, reqwest::Error>((status_code, headers, text))
            }
            .await;

            match outcome {
                Ok((status_code, headers, text)) => {
                    let response_time = started.elapsed();

                    if status_code >= 400 {
                        return Err(ProviderError::from_status(status_code, &text));
                    }

                    // Malformed bodies must never crash callers: capture
                    // anything non-JSON under a fallback key.
                    let data = if text.is_empty() {
                        json!({})
                    } else {
                        serde_json::from_str(&text)
                            .unwrap_or_else(|_| json!({ "raw_content": text }))
                    };

                    debug!(
                        method = %method,
                        url = %url,
                        status_code,
                        response_ms = response_time.as_millis() as u64,
                        "Request completed"
                    );

                    return Ok(ApiResponse {
                        data,
                        status_code,
                        headers,
                        response_time,
                        cached: false,
                    });
                }
                Err(e) => {
                    last_error = e.to_string();
                    if attempt == self.max_retries {
                        break;
                    }
                    let backoff = backoff_delay(attempt);
                    warn!(
                        url = %url,
                        attempt = attempt + 1,
                        backoff_secs = backoff.as_secs(),
                        error = %last_error,
                        "Transport failure, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }

        Err(ProviderError::Api(format!(
            "request failed after {} retries: {last_error}",
            self.max_retries
        )))
    }

    pub async fn get(
        &self,
        endpoint: &str,
        params: Option<&[(&str, &str)]>,
    ) -> Result<ApiResponse, ProviderError> {
        self.execute(Method::GET, endpoint, params, None).await
    }
}

/// Exponential backoff, `2^attempt` seconds. Capped so an oversized retry
/// budget from the environment cannot overflow the shift.
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(attempt.min(16)))
}

/// Default headers common to every provider, plus per-provider auth headers.
pub fn base_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("User-Agent", "sports-data-hub/0.1".parse().expect("static header"));
    headers.insert("Accept", "application/json".parse().expect("static header"));
    headers.insert("Content-Type", "application/json".parse().expect("static header"));
    headers
}
