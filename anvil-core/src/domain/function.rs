//! Deployment request domain types
//!
//! A `DeploymentRequest` is owned by exactly one pipeline execution and is
//! immutable once constructed. Validation happens before any other stage runs.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Maximum length the orchestrator accepts for a resource name (DNS-1123 label)
const MAX_NAME_LEN: usize = 63;

/// A single environment variable attached to a deployed function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub key: String,
    pub value: String,
}

/// A request to deploy an uploaded archive as a running service
#[derive(Debug, Clone)]
pub struct DeploymentRequest {
    /// Declared runtime (e.g. "node")
    pub runtime: String,
    /// Function name, also used as the service and image name
    pub name: String,
    /// Environment variables for the deployed container, in submission order
    pub env_vars: Vec<EnvVar>,
    /// Raw bytes of the uploaded archive
    pub archive: Vec<u8>,
}

impl DeploymentRequest {
    /// Validates the request fields.
    ///
    /// `runtime` and `name` must be non-empty, and `name` must be a valid
    /// resource identifier: lowercase alphanumeric plus hyphen, not starting
    /// or ending with a hyphen, at most 63 characters.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.runtime.is_empty() {
            return Err(ValidationError::MissingField("runtime"));
        }
        if self.name.is_empty() {
            return Err(ValidationError::MissingField("name"));
        }
        validate_resource_name(&self.name)
    }
}

fn validate_resource_name(name: &str) -> Result<(), ValidationError> {
    if name.len() > MAX_NAME_LEN {
        return Err(ValidationError::InvalidName {
            name: name.to_string(),
            reason: "name is longer than 63 characters",
        });
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(ValidationError::InvalidName {
            name: name.to_string(),
            reason: "name must contain only lowercase alphanumeric characters and hyphens",
        });
    }
    if name.starts_with('-') || name.ends_with('-') {
        return Err(ValidationError::InvalidName {
            name: name.to_string(),
            reason: "name must not start or end with a hyphen",
        });
    }
    Ok(())
}

/// Runtime family a function is built for
///
/// Each family carries one fixed build recipe that gets injected into the
/// build context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuntimeFamily {
    Node,
}

impl RuntimeFamily {
    /// Resolves the runtime family from the declared runtime string
    pub fn parse(runtime: &str) -> Result<Self, ValidationError> {
        let normalized = runtime.trim().to_ascii_lowercase();
        // Covers "node", "nodejs" and versioned forms like "node22"
        if normalized.starts_with("node") {
            return Ok(RuntimeFamily::Node);
        }
        Err(ValidationError::UnsupportedRuntime(runtime.to_string()))
    }

    /// The fixed build recipe body for this runtime family
    pub fn recipe(&self) -> &'static str {
        match self {
            RuntimeFamily::Node => NODE_RECIPE,
        }
    }
}

/// Build recipe for the Node runtime family
const NODE_RECIPE: &str = r#"
# https://hub.docker.com/_/node
FROM node:22.14.0-slim

# Create and change to the app directory.
WORKDIR /usr/src/app

COPY package*.json ./

RUN npm install --only=production
# Copy local code to the container image.
COPY . /usr/src/app

# Run the web service on container startup.
CMD [ "npm", "start" ]
"#;

/// Terminal value returned to the caller after a successful deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentResult {
    /// Fully qualified reference of the published image
    pub image_reference: String,
    /// Name of the deployed service
    pub service_name: String,
    /// Human-readable summary
    pub message: String,
}
