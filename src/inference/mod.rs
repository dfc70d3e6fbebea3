//! Inference service access
//!
//! The [`InferenceBackend`] trait is the seam between the orchestrator and the
//! model-serving endpoint. [`OllamaClient`] talks to a local Ollama server over
//! HTTP; tests substitute scripted backends.

mod model;
mod ollama;

pub use model::{InteractiveSelector, ModelInfo, ModelSelector, resolve_model};
pub use ollama::{LARGE_PAYLOAD_BYTES, OllamaClient};

use crate::error::InferenceError;
use async_trait::async_trait;

/// Raw output of one generation call
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceResponse {
    /// Generated text
    pub text: String,
    /// Full response body as returned by the service
    pub raw: serde_json::Value,
}

/// Trait for model-serving backends
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Issue a single generation request. Failures are never retried here.
    async fn generate(&self, model: &str, prompt: &str) -> Result<InferenceResponse, InferenceError>;

    /// Models currently available on the service
    async fn list_models(&self) -> Result<Vec<ModelInfo>, InferenceError>;

    /// Endpoint description for logs
    fn endpoint(&self) -> &str;
}

#[async_trait]
impl<T: InferenceBackend + ?Sized> InferenceBackend for std::sync::Arc<T> {
    async fn generate(&self, model: &str, prompt: &str) -> Result<InferenceResponse, InferenceError> {
        (**self).generate(model, prompt).await
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, InferenceError> {
        (**self).list_models().await
    }

    fn endpoint(&self) -> &str {
        (**self).endpoint()
    }
}
