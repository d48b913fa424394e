//! Error types for the API layer.

use thiserror::Error;

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors that can occur talking to the remote service.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced an HTTP response (DNS, connect, timeout).
    #[error("network unreachable: {0}")]
    Connectivity(String),

    /// The server rejected the request with a structured error; the message
    /// is suitable for direct display to the user.
    #[error("request rejected: {message}")]
    Invalid { message: String },

    /// The resource does not exist on the server.
    #[error("resource not found")]
    NotFound,

    /// Any other non-success status.
    #[error("unexpected status {status}")]
    Unexpected { status: u16 },

    /// The response body did not match the expected shape.
    #[error("malformed response: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Reading or writing attachment bytes on disk failed.
    #[error("file I/O: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// True when the failure means the network is absent rather than the
    /// request being wrong.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, ApiError::Connectivity(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Connectivity(err.to_string())
    }
}
