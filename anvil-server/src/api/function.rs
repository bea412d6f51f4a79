//! Function API Handlers
//!
//! HTTP endpoints for deploying and inspecting functions.

use axum::{
    Json,
    extract::{Multipart, Path, State},
};

use anvil_core::domain::function::{DeploymentRequest, EnvVar};
use anvil_core::dto::{DeployResponse, FunctionView};

use crate::api::error::{ApiError, ApiResult};
use crate::api::identity::Identity;
use crate::service::deployment_service;
use crate::state::AppState;

/// POST /api/functions
/// Deploy an uploaded archive as a running function
///
/// Multipart form fields:
/// - `file` (required): archive bytes
/// - `runtime` (required): runtime family, e.g. "node"
/// - `name` (required): function name
/// - `env_vars` (optional): JSON array of `{key, value}` objects
pub async fn deploy_function(
    State(state): State<AppState>,
    identity: Identity,
    multipart: Multipart,
) -> ApiResult<Json<DeployResponse>> {
    let request = request_from_multipart(multipart).await?;

    tracing::info!(
        "Deployment request for function {} from {}/{}",
        request.name,
        identity.provider,
        identity.username
    );

    let result = deployment_service::deploy_function(
        &state,
        &identity.username,
        &identity.provider,
        request,
    )
    .await
    .map_err(ApiError::from)?;

    Ok(Json(DeployResponse {
        message: "Function deployed successfully".to_string(),
        result,
    }))
}

/// GET /api/functions/{name}
/// Get a deployed function for the caller's tenant namespace
pub async fn get_function(
    State(state): State<AppState>,
    identity: Identity,
    Path(name): Path<String>,
) -> ApiResult<Json<FunctionView>> {
    tracing::debug!(
        "Getting function {} for {}/{}",
        name,
        identity.provider,
        identity.username
    );

    let function =
        deployment_service::get_function(&state, &identity.username, &identity.provider, &name)
            .await
            .map_err(ApiError::from)?;

    Ok(Json(function))
}

/// GET /api/functions
/// List deployed functions for the caller's tenant namespace
///
/// An empty namespace answers 404, not an empty list.
pub async fn list_functions(
    State(state): State<AppState>,
    identity: Identity,
) -> ApiResult<Json<Vec<FunctionView>>> {
    tracing::debug!(
        "Listing functions for {}/{}",
        identity.provider,
        identity.username
    );

    let functions =
        deployment_service::list_functions(&state, &identity.username, &identity.provider)
            .await
            .map_err(ApiError::from)?;

    Ok(Json(functions))
}

/// Assembles a deployment request from the multipart form
async fn request_from_multipart(mut multipart: Multipart) -> Result<DeploymentRequest, ApiError> {
    let mut archive: Option<Vec<u8>> = None;
    let mut runtime = String::new();
    let mut name = String::new();
    let mut env_vars: Vec<EnvVar> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("failed to read multipart form: {}", e)))?
    {
        match field.name() {
            Some("file") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("failed to read file field: {}", e)))?;
                archive = Some(bytes.to_vec());
            }
            Some("runtime") => {
                runtime = read_text_field(field, "runtime").await?;
            }
            Some("name") => {
                name = read_text_field(field, "name").await?;
            }
            Some("env_vars") => {
                let raw = read_text_field(field, "env_vars").await?;
                if !raw.is_empty() {
                    env_vars = serde_json::from_str(&raw).map_err(|e| {
                        ApiError::BadRequest(format!("failed to parse env_vars JSON: {}", e))
                    })?;
                }
            }
            _ => {}
        }
    }

    let archive =
        archive.ok_or_else(|| ApiError::BadRequest("file field is required".to_string()))?;

    Ok(DeploymentRequest {
        runtime,
        name,
        env_vars,
        archive,
    })
}

async fn read_text_field(
    field: axum::extract::multipart::Field<'_>,
    name: &str,
) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::BadRequest(format!("failed to read {} field: {}", name, e)))
}
