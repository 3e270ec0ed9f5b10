//! Common types for generation backends.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when talking to a generation backend.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("generation endpoint returned {status}: {message}")]
    Api {
        status: reqwest::StatusCode,
        message: String,
    },

    #[error("UTF-8 decoding failed: {0}")]
    Decode(#[from] std::str::Utf8Error),
}

pub type Result<T> = std::result::Result<T, ProviderError>;

/// Generator trait for text-generation backends.
///
/// Implementations stream the completion for a single request. The trait
/// exists so the session can be driven by a scripted backend in tests.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Stream a completion.
    ///
    /// The callback is invoked for each decoded chunk of response text, in
    /// order, until the stream is exhausted.
    async fn generate<'a>(
        &'a self,
        request: GenerateRequest,
        callback: Box<dyn for<'b> FnMut(&'b str) + Send + 'a>,
    ) -> Result<()>;
}

/// Request body for the generation endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serializes_to_prompt_body() {
        let request = GenerateRequest::new("a prompt");
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value, serde_json::json!({ "prompt": "a prompt" }));
    }
}
