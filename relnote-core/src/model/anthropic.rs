//! Anthropic Messages API client

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::ModelConfig;
use crate::model::{CompletionRequest, ModelBackend};
use crate::{Error, Result};

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Messages API response
#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

/// A content block in a Messages API response
///
/// Thinking blocks precede the text when extended thinking is enabled.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    #[allow(dead_code)]
    Thinking {
        #[serde(default)]
        thinking: String,
    },
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

/// Messages API error body
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    r#type: String,
    message: String,
}

/// Anthropic Messages API backend
pub struct AnthropicClient {
    client: reqwest::Client,
    api_key: String,
    config: ModelConfig,
    url: String,
}

impl AnthropicClient {
    /// Create a client with the given API key and model configuration
    pub fn new(api_key: impl Into<String>, config: ModelConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Model(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            config,
            url: MESSAGES_URL.to_string(),
        })
    }

    /// Override the endpoint URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

impl std::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("model", &self.config.model)
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ModelBackend for AnthropicClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        debug!(
            model = %self.config.model,
            prompt_chars = request.prompt.len(),
            "Sending completion request"
        );

        let mut body = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "messages": [{"role": "user", "content": request.prompt}],
        });

        if self.config.thinking_budget > 0 {
            body["thinking"] = json!({
                "type": "enabled",
                "budget_tokens": self.config.thinking_budget,
            });
        }

        let response = self
            .client
            .post(&self.url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Model(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response".to_string());
            // Prefer the structured API error message when present
            if let Ok(parsed) = serde_json::from_str::<ApiErrorResponse>(&text) {
                return Err(Error::Model(format!(
                    "API error {} ({}): {}",
                    status, parsed.error.r#type, parsed.error.message
                )));
            }
            return Err(Error::Model(format!(
                "Request failed with status {}: {}",
                status, text
            )));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| Error::Model(format!("Failed to parse response: {}", e)))?;

        extract_text(parsed)
    }
}

/// Pull the first text block out of a response, skipping thinking blocks
fn extract_text(response: MessagesResponse) -> Result<String> {
    response
        .content
        .into_iter()
        .find_map(|block| match block {
            ContentBlock::Text { text } => Some(text.trim().to_string()),
            _ => None,
        })
        .filter(|text| !text.is_empty())
        .ok_or_else(|| Error::Model("Response contained no text content".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_text_skips_thinking_blocks() {
        let response: MessagesResponse = serde_json::from_str(
            r#"{"content":[
                {"type":"thinking","thinking":"hmm"},
                {"type":"text","text":"  the answer  "}
            ]}"#,
        )
        .unwrap();

        assert_eq!(extract_text(response).unwrap(), "the answer");
    }

    #[test]
    fn test_extract_text_without_text_block_fails() {
        let response: MessagesResponse =
            serde_json::from_str(r#"{"content":[{"type":"thinking","thinking":"hmm"}]}"#).unwrap();
        assert!(extract_text(response).is_err());
    }

    #[test]
    fn test_unknown_block_types_are_tolerated() {
        let response: MessagesResponse = serde_json::from_str(
            r#"{"content":[
                {"type":"tool_use","id":"x","name":"y","input":{}},
                {"type":"text","text":"ok"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(response).unwrap(), "ok");
    }

    #[test]
    fn test_api_error_body_parses() {
        let body = r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#;
        let parsed: ApiErrorResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.error.r#type, "overloaded_error");
        assert_eq!(parsed.error.message, "Overloaded");
    }
}
