use super::{InferenceBackend, InferenceResponse, ModelInfo};
use crate::error::InferenceError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Payloads above this size are likely to make the model slow or hang
pub const LARGE_PAYLOAD_BYTES: usize = 100_000;

/// Longest slice of a response body quoted in an error
const ERROR_SNIPPET_CHARS: usize = 500;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

/// HTTP client for an Ollama `/api/generate` endpoint.
///
/// Holds one connection pool for the whole run.
pub struct OllamaClient {
    http: reqwest::Client,
    api_url: String,
    timeout: Duration,
    list_timeout: Duration,
}

impl OllamaClient {
    /// Create a client for `api_url` with a per-request timeout
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self, InferenceError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("commit-audit/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| InferenceError::ClientBuild(e.to_string()))?;

        Ok(Self {
            http,
            api_url: api_url.into(),
            timeout,
            list_timeout: Duration::from_secs(10),
        })
    }

    /// Timeout used when listing models
    pub fn with_list_timeout(mut self, list_timeout: Duration) -> Self {
        self.list_timeout = list_timeout;
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// `/api/tags` on the same server as the generate endpoint
    pub fn tags_url(&self) -> String {
        let base = match self.api_url.find("/api/") {
            Some(idx) => &self.api_url[..idx],
            None => self.api_url.trim_end_matches('/'),
        };
        format!("{}/api/tags", base)
    }
}

#[async_trait]
impl InferenceBackend for OllamaClient {
    async fn generate(&self, model: &str, prompt: &str) -> Result<InferenceResponse, InferenceError> {
        let payload = GenerateRequest {
            model,
            prompt,
            stream: false,
        };

        let payload_size = serde_json::to_vec(&payload)
            .map(|bytes| bytes.len())
            .unwrap_or_default();
        tracing::debug!(
            "Sending request to {} (payload size: {} bytes)",
            self.api_url,
            payload_size
        );
        if payload_size > LARGE_PAYLOAD_BYTES {
            tracing::warn!(
                "Payload size {} bytes exceeds {} bytes; this may cause timeouts or hangs",
                payload_size,
                LARGE_PAYLOAD_BYTES
            );
        }

        let response = self
            .http
            .post(&self.api_url)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|e| classify(&self.api_url, e, self.timeout))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| classify(&self.api_url, e, self.timeout))?;

        let code = status.as_u16();
        if !status.is_success() {
            return Err(InferenceError::unexpected_body(
                format!("HTTP {}: {}", code, snippet(&body)),
                code,
                body,
            ));
        }

        let raw: Value = match serde_json::from_str(&body) {
            Ok(raw) => raw,
            Err(e) => {
                return Err(InferenceError::unexpected_body(
                    format!(
                        "Failed to parse JSON response: {}. Raw response: {}",
                        e,
                        snippet(&body)
                    ),
                    code,
                    body,
                ));
            }
        };

        let Some(text) = raw.get("response").and_then(Value::as_str) else {
            return Err(InferenceError::unexpected_body(
                format!("Missing 'response' field in API response: {}", snippet(&body)),
                code,
                body,
            ));
        };
        let text = text.to_string();

        Ok(InferenceResponse { text, raw })
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, InferenceError> {
        let url = self.tags_url();
        tracing::info!("Querying available models at {}", url);

        let response = self
            .http
            .get(&url)
            .timeout(self.list_timeout)
            .send()
            .await
            .map_err(|e| classify(&url, e, self.list_timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(InferenceError::unexpected(format!(
                "HTTP {} from {}",
                status.as_u16(),
                url
            )));
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| InferenceError::unexpected(format!("Invalid model list: {}", e)))?;

        tracing::info!("Found {} models", tags.models.len());
        Ok(tags.models)
    }

    fn endpoint(&self) -> &str {
        &self.api_url
    }
}

fn classify(url: &str, err: reqwest::Error, timeout: Duration) -> InferenceError {
    if err.is_timeout() {
        InferenceError::RequestTimeout(timeout.as_secs())
    } else if err.is_connect() {
        InferenceError::ServiceUnavailable {
            url: url.to_string(),
            reason: err.to_string(),
        }
    } else if err.is_decode() || err.is_body() {
        InferenceError::unexpected(err.to_string())
    } else {
        InferenceError::ServiceUnavailable {
            url: url.to_string(),
            reason: err.to_string(),
        }
    }
}

/// First few hundred characters of a body, for error messages
fn snippet(body: &str) -> String {
    if body.chars().count() <= ERROR_SNIPPET_CHARS {
        body.to_string()
    } else {
        let cut: String = body.chars().take(ERROR_SNIPPET_CHARS).collect();
        format!("{}...", cut)
    }
}
