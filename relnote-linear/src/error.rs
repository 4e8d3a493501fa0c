//! Error types for Linear operations

use thiserror::Error;

/// Result type for Linear operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during Linear operations
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP transport error
    #[error("Linear request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("Linear API returned status {status}: {body}")]
    Api { status: u16, body: String },

    /// Errors reported in the GraphQL response body
    #[error("Linear GraphQL errors: {0}")]
    GraphQl(String),

    /// Response body could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<Error> for relnote_core::Error {
    fn from(err: Error) -> Self {
        relnote_core::Error::Fetch(err.to_string())
    }
}
