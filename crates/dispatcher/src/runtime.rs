//! HTTP runtime collaborator: sends one built request, retrying transient
//! failures with exponential backoff, and classifies the final outcome.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use tracing::{debug, warn};

use iterable_core::{HttpSettings, IntegrationError, IntegrationResult};

use crate::request::VendorRequest;

/// Status and body returned by the vendor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorResponse {
    pub status: u16,
    pub body: String,
}

impl VendorResponse {
    pub fn json(&self) -> Option<serde_json::Value> {
        serde_json::from_str(&self.body).ok()
    }
}

/// Transport used by the destination. One call per dispatched event.
#[async_trait]
pub trait HttpIntegrationRuntime: Send + Sync {
    async fn send(&self, request: &VendorRequest) -> IntegrationResult<VendorResponse>;
}

// ─── Retry Policy ───────────────────────────────────────────────────────

/// Retry configuration with exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff_ms: 200,
            max_backoff_ms: 5_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl From<&HttpSettings> for RetryPolicy {
    fn from(settings: &HttpSettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            initial_backoff_ms: settings.initial_backoff_ms,
            ..Self::default()
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `attempt` (0-indexed).
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let base_ms = self.initial_backoff_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        Duration::from_millis(base_ms.min(self.max_backoff_ms as f64) as u64)
    }

    /// 401 is retried too: the budget applies to every vendor rejection.
    pub fn is_retryable(error: &IntegrationError) -> bool {
        match error {
            IntegrationError::Authentication { .. } => true,
            IntegrationError::Transport { status: None, .. } => true,
            IntegrationError::Transport {
                status: Some(status),
                ..
            } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

/// Map a non-2xx response onto the error taxonomy.
pub fn classify(response: VendorResponse) -> IntegrationResult<VendorResponse> {
    match response.status {
        200..=299 => Ok(response),
        401 => Err(IntegrationError::Authentication {
            body: response.body,
        }),
        status => Err(IntegrationError::Transport {
            status: Some(status),
            body: response.body,
        }),
    }
}

// ─── reqwest runtime ────────────────────────────────────────────────────

/// Production runtime on top of a shared `reqwest` client.
pub struct HttpRuntime {
    client: Client,
    retry: RetryPolicy,
}

impl HttpRuntime {
    pub fn new(settings: &HttpSettings) -> IntegrationResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()
            .map_err(|e| IntegrationError::Configuration(format!("http client: {e}")))?;
        Ok(Self {
            client,
            retry: RetryPolicy::from(settings),
        })
    }

    async fn send_once(&self, request: &VendorRequest) -> IntegrationResult<VendorResponse> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|e| IntegrationError::Configuration(format!("http method: {e}")))?;

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(*name, value.as_str());
        }

        let response = builder
            .body(request.body_bytes()?)
            .send()
            .await
            .map_err(|e| {
                if e.is_builder() {
                    IntegrationError::Configuration(format!("invalid request: {e}"))
                } else {
                    IntegrationError::Transport {
                        status: None,
                        body: e.to_string(),
                    }
                }
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| IntegrationError::Transport {
            status: Some(status),
            body: format!("failed to read response body: {e}"),
        })?;
        classify(VendorResponse { status, body })
    }
}

#[async_trait]
impl HttpIntegrationRuntime for HttpRuntime {
    async fn send(&self, request: &VendorRequest) -> IntegrationResult<VendorResponse> {
        let endpoint = request.endpoint.path();
        let mut attempt = 0;
        loop {
            match self.send_once(request).await {
                Ok(response) => {
                    debug!(endpoint, status = response.status, attempt, "vendor accepted request");
                    metrics::counter!("iterable.requests", "endpoint" => endpoint, "outcome" => "success")
                        .increment(1);
                    return Ok(response);
                }
                Err(err) if attempt < self.retry.max_retries && RetryPolicy::is_retryable(&err) => {
                    let backoff = self.retry.backoff_for_attempt(attempt);
                    warn!(
                        endpoint,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %err,
                        "vendor request failed, retrying"
                    );
                    metrics::counter!("iterable.requests", "endpoint" => endpoint, "outcome" => "retry")
                        .increment(1);
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(err) => {
                    metrics::counter!("iterable.requests", "endpoint" => endpoint, "outcome" => "failure")
                        .increment(1);
                    return Err(err);
                }
            }
        }
    }
}
