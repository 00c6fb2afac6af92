//! Client error type.
//!
//! These errors never reach the host UI: the notification store and the
//! comment stream log them and fall back to a default view.

use thiserror::Error;

/// Failure of a REST call or of the live transport.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The HTTP request could not be completed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an error status.
    #[error("server returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message from the error body, if any.
        message: String,
    },

    /// The response body did not have the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// The request did not finish within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The live connection failed.
    #[error("live transport error: {0}")]
    Transport(String),

    /// The operation needs a signed-in session.
    #[error("not signed in")]
    SignedOut,

    /// A base URL in the configuration is malformed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Result alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
