//! Incoming-webhook client

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use relnote_core::publish::Publisher;

use crate::{Error, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A Slack incoming webhook
pub struct SlackWebhook {
    http: reqwest::Client,
    url: String,
}

impl SlackWebhook {
    /// Create a webhook client for the given URL
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    /// Post a message to the webhook
    ///
    /// Link unfurling is disabled: release notes often reference many
    /// URLs and the previews drown the message.
    pub async fn post(&self, text: &str) -> Result<()> {
        let body = json!({
            "text": text,
            "unfurl_links": false,
            "unfurl_media": false,
        });

        debug!(chars = text.len(), "Posting to Slack webhook");

        let response = self.http.post(&self.url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response".to_string());
            return Err(Error::Webhook { status, body });
        }

        info!("Posted message to Slack");
        Ok(())
    }
}

#[async_trait]
impl Publisher for SlackWebhook {
    async fn deliver(&self, message: &str) -> relnote_core::Result<()> {
        Ok(self.post(message).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shape() {
        let body = json!({
            "text": "🚀 *Product Updates*",
            "unfurl_links": false,
            "unfurl_media": false,
        });
        assert_eq!(body["text"], "🚀 *Product Updates*");
        assert_eq!(body["unfurl_links"], false);
    }

    #[tokio::test]
    async fn test_invalid_url_is_an_error() {
        let webhook = SlackWebhook::new("not a url").unwrap();
        let result = webhook.post("hello").await;
        assert!(matches!(result, Err(Error::Http(_))));
    }
}
