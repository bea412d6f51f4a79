//! DTOs for the HTTP surface

use serde::{Deserialize, Serialize};

use crate::domain::function::DeploymentResult;

/// Response body for a successful deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployResponse {
    pub message: String,
    pub result: DeploymentResult,
}

/// Read-back view of a deployed function
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionView {
    pub name: String,
    pub namespace: String,
    pub image: String,
    /// Public URL, present once the orchestrator has reconciled the service
    pub url: Option<String>,
}
