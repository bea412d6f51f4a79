//! Error types for the orchestrator resource client

use thiserror::Error;

/// Result type alias for cluster operations
pub type Result<T> = std::result::Result<T, ClusterError>;

/// Errors that can occur when talking to the orchestrator resource API
#[derive(Debug, Error)]
pub enum ClusterError {
    /// HTTP request to the orchestrator failed
    #[error("cluster request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API returned an error status code
    #[error("cluster API error (status {status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// The requested resource does not exist
    #[error("resource not found: {0}")]
    NotFound(String),

    /// Namespace lookup or creation failed
    #[error("namespace error: {0}")]
    Namespace(String),

    /// The orchestrator rejected the service submission
    #[error("deployment error: {0}")]
    Deployment(String),

    /// Status was queried before the orchestrator reconciled the service
    #[error("service not ready: {0}")]
    NotReady(String),

    /// Failed to parse an API response
    #[error("failed to parse response: {0}")]
    Parse(String),
}

impl ClusterError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_)) || matches!(self, Self::Api { status: 404, .. })
    }

    /// Check if this error is an "already exists" conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Api { status: 409, .. })
    }
}
