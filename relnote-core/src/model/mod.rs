//! Model invocation seam
//!
//! Every pipeline stage is one round-trip to an external language model.
//! The [`ModelBackend`] trait is the seam between the stages and the wire
//! client, so tests can script responses without network access.

mod anthropic;

pub use anthropic::AnthropicClient;

use async_trait::async_trait;

use crate::Result;

/// A single completion request
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// The full user prompt
    pub prompt: String,
}

impl CompletionRequest {
    /// Create a request from a prompt
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }
}

/// Backend capable of completing a prompt
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Complete a prompt, returning the model's text output
    async fn complete(&self, request: CompletionRequest) -> Result<String>;
}
