//! Client error type.

use std::sync::Arc;

use quill_core::ports::CacheError;

/// Cheap to clone so one failed request can be reported to every caller
/// that was waiting on it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    /// Transport failure.
    #[error("HTTP error: {0}")]
    Http(#[source] Arc<reqwest::Error>),

    /// The API answered with a non-success status.
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// A success body that does not have the expected shape.
    #[error("Unexpected response body: {0}")]
    Decode(#[source] Arc<serde_json::Error>),

    #[error("Invalid base URL: {0}")]
    BaseUrl(String),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(Arc::new(err))
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(Arc::new(err))
    }
}

impl ClientError {
    /// HTTP status of an API error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
