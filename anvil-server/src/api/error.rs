//! API Error Handling
//!
//! Unified error types and conversion for API responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use anvil_cluster::ClusterError;
use anvil_core::error::ArchiveError;
use anvil_engine::EngineError;

use crate::service::deployment::DeployError;

/// API error type
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Forbidden(String),
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Forbidden(msg) => {
                tracing::warn!("Forbidden: {}", msg);
                (StatusCode::FORBIDDEN, msg)
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<DeployError> for ApiError {
    fn from(err: DeployError) -> Self {
        match &err {
            DeployError::Validation(_) => ApiError::BadRequest(err.to_string()),
            DeployError::Archive { source, .. } => match source {
                ArchiveError::UnsupportedFormat { .. }
                | ArchiveError::Unrecognized
                | ArchiveError::UnsupportedEntry { .. }
                | ArchiveError::Zip(_) => ApiError::BadRequest(err.to_string()),
                ArchiveError::Read(_) | ArchiveError::Rewrite(_) => {
                    ApiError::InternalError(err.to_string())
                }
            },
            DeployError::Engine { source, .. } => match source {
                EngineError::AuthorizationDenied(_) => ApiError::Forbidden(err.to_string()),
                _ => ApiError::InternalError(err.to_string()),
            },
            DeployError::Cluster { source, .. } => match source {
                ClusterError::NotFound(_) => ApiError::NotFound(err.to_string()),
                ClusterError::Api { status: 404, .. } => ApiError::NotFound(err.to_string()),
                _ => ApiError::InternalError(err.to_string()),
            },
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let err = DeployError::Validation(anvil_core::error::ValidationError::MissingField(
            "runtime",
        ));
        assert!(matches!(ApiError::from(err), ApiError::BadRequest(_)));
    }

    #[test]
    fn test_unsupported_format_maps_to_bad_request() {
        let err = DeployError::Archive {
            stage: "archive normalization",
            source: ArchiveError::UnsupportedFormat {
                media_type: "application/x-7z-compressed".to_string(),
            },
        };
        assert!(matches!(ApiError::from(err), ApiError::BadRequest(_)));
    }

    #[test]
    fn test_denied_push_maps_to_forbidden() {
        let err = DeployError::Engine {
            stage: "image publish",
            source: EngineError::AuthorizationDenied("denied: access is denied".to_string()),
        };
        assert!(matches!(ApiError::from(err), ApiError::Forbidden(_)));
    }

    #[test]
    fn test_missing_function_maps_to_not_found() {
        let err = DeployError::Cluster {
            stage: "service lookup",
            source: ClusterError::NotFound("service github-alice/hello".to_string()),
        };
        assert!(matches!(ApiError::from(err), ApiError::NotFound(_)));
    }

    #[test]
    fn test_build_failure_maps_to_internal() {
        let err = DeployError::Engine {
            stage: "image build",
            source: EngineError::Build("npm install failed".to_string()),
        };
        assert!(matches!(ApiError::from(err), ApiError::InternalError(_)));
    }
}
