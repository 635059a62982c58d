use crate::infrastructure::HttpError;
use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when using the signaling client.
#[derive(Error, Debug)]
pub enum SignalingError {
    /// The HTTP round-trip itself failed (DNS, refused connection, aborted call, ...)
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The server answered, but not with `200 OK`
    #[error("Invalid StatusCode '{0}'")]
    InvalidStatus(StatusCode),

    /// `connect` was called while a session is active or being established
    #[error("Already connected")]
    AlreadyConnected,

    /// An operation that needs a session was called without one
    #[error("Not connected")]
    NotConnected,

    /// The response did not carry a usable peer id header
    #[error("Invalid peer id header: {0}")]
    InvalidPeerId(String),

    /// The authentication token cannot be used as a header value
    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    /// URL parsing error (malformed server URI)
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Configuration file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The operation was stopped through its cancellation token
    #[error("Operation cancelled")]
    Cancelled,

    /// A background task panicked
    #[error("Background task panicked: {0}")]
    TaskPanicked(String),
}

impl SignalingError {
    /// Whether this error is the expected outcome of a requested stop.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Http(HttpError::Cancelled))
    }
}

/// Convenience type alias for `Result<T, SignalingError>`.
pub type Result<T> = std::result::Result<T, SignalingError>;
