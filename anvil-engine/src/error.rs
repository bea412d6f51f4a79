//! Error types for the build engine client

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur when talking to the build engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// HTTP request to the engine failed
    #[error("engine request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// A required registry credential is not configured
    #[error("registry credential missing: {0} is not set")]
    CredentialsMissing(&'static str),

    /// The engine rejected or failed the build
    #[error("image build failed: {0}")]
    Build(String),

    /// The push failed or the engine reported an error event
    #[error("image push failed: {0}")]
    Publish(String),

    /// The registry denied access during push
    #[error("registry denied access: {0}")]
    AuthorizationDenied(String),

    /// The engine did not become reachable within the startup deadline
    #[error("build engine not ready after {0:?}")]
    NotReady(std::time::Duration),

    /// Failed to encode the registry auth token
    #[error("failed to encode registry auth: {0}")]
    Encode(#[from] serde_json::Error),
}
