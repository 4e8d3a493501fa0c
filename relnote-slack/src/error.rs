//! Error types for Slack delivery

use thiserror::Error;

/// Result type for Slack operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during Slack delivery
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP transport error
    #[error("Slack request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Webhook rejected the message
    #[error("Slack webhook returned status {status}: {body}")]
    Webhook { status: u16, body: String },
}

impl From<Error> for relnote_core::Error {
    fn from(err: Error) -> Self {
        relnote_core::Error::Delivery(err.to_string())
    }
}
