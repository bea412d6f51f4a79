//! Service descriptor domain type

use serde::{Deserialize, Serialize};

use crate::domain::function::EnvVar;

/// Desired state of a deployed function, submitted to the orchestrator
///
/// The orchestrator owns the record once submitted; the pipeline only ever
/// holds a snapshot. Redeploying the same (namespace, name) pair overwrites
/// the previous descriptor wholesale, last writer wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    /// Service name, identical to the function name
    pub name: String,
    /// Tenant namespace the service lives in
    pub namespace: String,
    /// Fully qualified image reference to run
    pub image: String,
    /// Environment variables for the container
    pub env_vars: Vec<EnvVar>,
}
