//! Tenant namespace management
//!
//! Every tenant gets one isolation boundary named after their identity.
//! Namespaces are created on first use and never deleted by the pipeline;
//! deletion is an out-of-band admin operation.

use tracing::{debug, info};

use crate::error::{ClusterError, Result};
use crate::manifest::NamespaceManifest;

/// Resolves the deterministic namespace name for a tenant identity
///
/// Pure function of (owner, provider): `provider + "-" + owner`. Calling it
/// twice with the same inputs always yields the same string.
pub fn resolve_name(owner: &str, provider: &str) -> String {
    format!("{}-{}", provider, owner)
}

/// Next step after the namespace lookup
#[derive(Debug)]
enum LookupStep {
    /// The namespace already exists under this name
    Ready(String),
    /// Not found, move on to creation
    Create,
    /// Terminal lookup failure
    Fail(ClusterError),
}

/// Classifies the lookup answer into the next pipeline step
fn after_lookup(result: Result<NamespaceManifest>, name: &str) -> LookupStep {
    match result {
        Ok(namespace) => LookupStep::Ready(namespace.metadata.name),
        Err(e) if e.is_not_found() => LookupStep::Create,
        Err(e) => LookupStep::Fail(ClusterError::Namespace(format!(
            "failed to look up namespace {}: {}",
            name, e
        ))),
    }
}

/// Classifies the create answer into the terminal verdict.
///
/// An "already exists" conflict means another deployment for the same tenant
/// created the namespace between the lookup and the create; that is success.
fn after_create(result: Result<NamespaceManifest>, name: &str) -> Result<String> {
    match result {
        Ok(namespace) => Ok(namespace.metadata.name),
        Err(e) if e.is_conflict() => Ok(name.to_string()),
        Err(e) => Err(ClusterError::Namespace(format!(
            "failed to create namespace {}: {}",
            name, e
        ))),
    }
}

impl crate::ClusterClient {
    /// Looks up a namespace by name
    pub async fn get_namespace(&self, name: &str) -> Result<NamespaceManifest> {
        let url = self.namespaces_url(Some(name));
        let response = self.http().get(&url).send().await?;

        if response.status().as_u16() == 404 {
            return Err(ClusterError::NotFound(format!("namespace {}", name)));
        }
        self.handle_response(response).await
    }

    /// Creates a namespace
    pub async fn create_namespace(&self, name: &str) -> Result<NamespaceManifest> {
        let url = self.namespaces_url(None);
        let manifest = NamespaceManifest::new(name);
        let response = self.http().post(&url).json(&manifest).send().await?;

        self.handle_response(response).await
    }

    /// Ensures the tenant's namespace exists, creating it on first use.
    ///
    /// Lookup by the resolved name; a not-found answer triggers creation.
    /// Concurrent first-use by the same tenant can race on the create, so an
    /// "already exists" conflict is a terminal success, not an error. Any
    /// other lookup or create failure surfaces as a namespace error.
    pub async fn get_or_create_namespace(&self, owner: &str, provider: &str) -> Result<String> {
        let name = resolve_name(owner, provider);

        match after_lookup(self.get_namespace(&name).await, &name) {
            LookupStep::Ready(name) => {
                debug!("Namespace {} already exists", name);
                Ok(name)
            }
            LookupStep::Create => {
                let created = after_create(self.create_namespace(&name).await, &name)?;
                info!("Namespace {} ready", created);
                Ok(created)
            }
            LookupStep::Fail(e) => Err(e),
        }
    }
}
