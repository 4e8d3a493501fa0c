//! Error types for relnote

use thiserror::Error;

use crate::pipeline::Stage;

/// Result type alias for relnote operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for relnote operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Ticket source unreachable or retries exhausted
    #[error("Ticket fetch failed: {0}")]
    Fetch(String),

    /// Model invocation failed (transport, auth, or empty response)
    #[error("Model invocation failed: {0}")]
    Model(String),

    /// A stage's structured output could not be parsed
    ///
    /// Carries the raw response so a prompt/response mismatch can be
    /// diagnosed from the error alone.
    #[error("{stage} stage returned an unparsable response: {raw}")]
    MalformedResponse {
        /// The stage that produced the response
        stage: Stage,
        /// The raw model output
        raw: String,
    },

    /// Grouping violated the exact-coverage invariant
    #[error("grouping did not cover the input exactly (missing: {missing:?}, unexpected: {unexpected:?})")]
    IncompleteGrouping {
        /// Ticket ids absent from every group
        missing: Vec<String>,
        /// Ticket ids referenced more than once or not part of the input
        unexpected: Vec<String>,
    },

    /// Outbound delivery failed after the notes were drafted
    #[error("Delivery failed: {0}")]
    Delivery(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether a stage should retry after this error
    ///
    /// Model transport errors and malformed or invariant-violating
    /// responses are worth another attempt; everything else aborts
    /// immediately.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Model(_) | Error::MalformedResponse { .. } | Error::IncompleteGrouping { .. }
        )
    }
}
