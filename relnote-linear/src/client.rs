//! HTTP client for the Linear GraphQL API

use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use crate::{Error, Result};

const DEFAULT_ENDPOINT: &str = "https://api.linear.app/graphql";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// GraphQL query response wrapper
#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQlError>>,
}

/// GraphQL error
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct GraphQlError {
    message: String,
    #[serde(default)]
    path: Vec<String>,
}

/// Client for the Linear GraphQL API
///
/// Linear personal API keys go in the `Authorization` header as-is,
/// without a `Bearer` prefix.
pub struct LinearClient {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl LinearClient {
    /// Create a client against the production Linear API
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        })
    }

    /// Point the client at an alternate endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Execute a GraphQL query
    pub(crate) async fn graphql<T: for<'de> Deserialize<'de>>(
        &self,
        query: &str,
        variables: &serde_json::Value,
    ) -> Result<T> {
        let request_body = json!({
            "query": query,
            "variables": variables,
        });

        debug!(endpoint = %self.endpoint, "Sending GraphQL request");

        let response = self
            .http
            .post(&self.endpoint)
            .header("Authorization", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response".to_string());
            return Err(Error::Api { status, body });
        }

        let graphql_response: GraphQlResponse<T> = response
            .json()
            .await
            .map_err(|e| Error::Parse(format!("Failed to parse GraphQL response: {}", e)))?;

        if let Some(errors) = graphql_response.errors {
            let messages: Vec<String> = errors.iter().map(|e| e.message.clone()).collect();
            return Err(Error::GraphQl(messages.join(", ")));
        }

        graphql_response
            .data
            .ok_or_else(|| Error::Parse("GraphQL response missing data".to_string()))
    }
}
