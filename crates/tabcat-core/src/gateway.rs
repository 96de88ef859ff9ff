//! Remote text-generation gateway.
//!
//! The only boundary crossing an external system. One request, bounded
//! timeout, typed failures. No automatic retries in the baseline: callers
//! opt into `generate_with_retry`, which retries timeouts only, since a
//! malformed prompt will not self-correct by resending it.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("gateway unavailable: {0}")]
    Unavailable(String),

    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("response contained no usable text")]
    EmptyResponse,
}

/// Seam for the remote service. The pipeline is generic over this so
/// tests run against a stub instead of the network.
pub trait TextGenerator {
    /// Send ordered payload parts; return the raw generated text.
    fn generate(
        &self,
        parts: &[String],
    ) -> impl Future<Output = Result<String, GatewayError>> + Send;
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub model: String,
    pub endpoint: String,
    pub timeout_secs: u64,
}

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    client: reqwest::Client,
    config: GatewayConfig,
    api_key: String,
}

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

impl GeminiClient {
    /// Build a client with the key from `GEMINI_API_KEY`.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let api_key = std::env::var(API_KEY_ENV)
            .map_err(|_| GatewayError::Unavailable(format!("{} is not set", API_KEY_ENV)))?;
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(config: GatewayConfig, api_key: String) -> Result<Self, GatewayError> {
        if api_key.trim().is_empty() {
            return Err(GatewayError::Unavailable(format!(
                "{} is empty",
                API_KEY_ENV
            )));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GatewayError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }
}

impl TextGenerator for GeminiClient {
    async fn generate(&self, parts: &[String]) -> Result<String, GatewayError> {
        debug!(
            "calling model {} with {} payload part(s)",
            self.config.model,
            parts.len()
        );

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: parts
                    .iter()
                    .map(|text| Part { text: text.clone() })
                    .collect(),
            }],
        };

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Timeout(self.config.timeout_secs)
                } else {
                    GatewayError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::RequestFailed(format!(
                "status {}: {}",
                status, body
            )));
        }

        let body: GenerateContentResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Timeout(self.config.timeout_secs)
            } else {
                GatewayError::EmptyResponse
            }
        })?;

        match extract_text(body) {
            Some(text) => Ok(text),
            None => Err(GatewayError::EmptyResponse),
        }
    }
}

/// Bounded retry for transient failures. Only timeouts are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
}

impl RetryPolicy {
    pub fn timeout_only(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay_ms: 500,
        }
    }
}

/// Call the gateway, retrying `GatewayTimeout` with exponential backoff up
/// to the policy's bound. Every other failure is returned immediately.
pub async fn generate_with_retry<G: TextGenerator>(
    gateway: &G,
    parts: &[String],
    policy: &RetryPolicy,
) -> Result<String, GatewayError> {
    let mut attempt: u32 = 0;
    loop {
        match gateway.generate(parts).await {
            Err(GatewayError::Timeout(secs)) if attempt < policy.max_retries => {
                let delay = Duration::from_millis(policy.base_delay_ms << attempt);
                attempt += 1;
                warn!(
                    "request timed out after {}s, retry {}/{} in {:?}",
                    secs, attempt, policy.max_retries, delay
                );
                tokio::time::sleep(delay).await;
            }
            other => return other,
        }
    }
}

// Wire format for the generateContent endpoint.

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

/// First candidate's text parts, concatenated. None when there is no
/// non-blank text to return.
fn extract_text(body: GenerateContentResponse) -> Option<String> {
    let content = body.candidates.into_iter().next()?.content?;
    let text: String = content
        .parts
        .into_iter()
        .map(|p| p.text)
        .collect::<Vec<_>>()
        .join("");
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyGateway {
        calls: AtomicU32,
        timeouts_before_success: u32,
    }

    impl TextGenerator for FlakyGateway {
        async fn generate(&self, _parts: &[String]) -> Result<String, GatewayError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.timeouts_before_success {
                Err(GatewayError::Timeout(60))
            } else {
                Ok("ok".to_string())
            }
        }
    }

    struct BrokenGateway {
        calls: AtomicU32,
    }

    impl TextGenerator for BrokenGateway {
        async fn generate(&self, _parts: &[String]) -> Result<String, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(GatewayError::RequestFailed("status 400: bad".to_string()))
        }
    }

    #[tokio::test]
    async fn test_retry_recovers_from_timeouts() {
        let gateway = FlakyGateway {
            calls: AtomicU32::new(0),
            timeouts_before_success: 2,
        };
        let policy = RetryPolicy {
            max_retries: 2,
            base_delay_ms: 1,
        };
        let result = generate_with_retry(&gateway, &[], &policy).await;
        assert_eq!(result, Ok("ok".to_string()));
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_bound() {
        let gateway = FlakyGateway {
            calls: AtomicU32::new(0),
            timeouts_before_success: 10,
        };
        let policy = RetryPolicy {
            max_retries: 2,
            base_delay_ms: 1,
        };
        let result = generate_with_retry(&gateway, &[], &policy).await;
        assert_eq!(result, Err(GatewayError::Timeout(60)));
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_request_failure_is_never_retried() {
        let gateway = BrokenGateway {
            calls: AtomicU32::new(0),
        };
        let policy = RetryPolicy {
            max_retries: 2,
            base_delay_ms: 1,
        };
        let result = generate_with_retry(&gateway, &[], &policy).await;
        assert!(matches!(result, Err(GatewayError::RequestFailed(_))));
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_extract_text_from_response() {
        let body: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"A,B\n"},{"text":"1,2\n"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(body), Some("A,B\n1,2\n".to_string()));
    }

    #[test]
    fn test_extract_text_empty_cases() {
        let no_candidates: GenerateContentResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(extract_text(no_candidates), None);

        let blank: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"   "}]}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(blank), None);
    }
}
