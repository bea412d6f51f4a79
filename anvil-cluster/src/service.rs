//! Service deployment and read-back
//!
//! Services are submitted declaratively as upserts: create when absent,
//! replace when present. A replace carries the live object's concurrency
//! token, so redeploying an existing function overwrites its descriptor
//! wholesale. Last writer wins per (namespace, name); there is no locking
//! across concurrent deployments of the same function.

use tracing::{debug, info};

use anvil_core::domain::service::ServiceDescriptor;

use crate::error::{ClusterError, Result};
use crate::manifest::{ServiceList, ServiceManifest};

/// Terminal verdict of the create attempt in an upsert
#[derive(Debug)]
enum CreateVerdict {
    /// The service did not exist and was created
    Created(Box<ServiceManifest>),
    /// A service with this name already exists; replace it
    ReplaceExisting,
    /// Terminal create failure
    Fail(ClusterError),
}

/// Classifies the create answer into the upsert's next step
fn after_create(
    result: Result<ServiceManifest>,
    namespace: &str,
    name: &str,
) -> CreateVerdict {
    match result {
        Ok(created) => CreateVerdict::Created(Box::new(created)),
        Err(e) if e.is_conflict() => CreateVerdict::ReplaceExisting,
        Err(e) => CreateVerdict::Fail(ClusterError::Deployment(format!(
            "failed to create service {}/{}: {}",
            namespace, name, e
        ))),
    }
}

impl crate::ClusterClient {
    /// Deploys a service descriptor, creating or replacing as needed.
    ///
    /// Returns the manifest as the orchestrator accepted it.
    pub async fn deploy_service(&self, descriptor: &ServiceDescriptor) -> Result<ServiceManifest> {
        let manifest = ServiceManifest::from_descriptor(descriptor);

        let verdict = after_create(
            self.create_service(&manifest).await,
            &descriptor.namespace,
            &descriptor.name,
        );
        match verdict {
            CreateVerdict::Created(created) => {
                info!(
                    "Created service {}/{}",
                    descriptor.namespace, descriptor.name
                );
                Ok(*created)
            }
            CreateVerdict::ReplaceExisting => {
                debug!(
                    "Service {}/{} already exists, replacing",
                    descriptor.namespace, descriptor.name
                );
                self.replace_service(manifest).await
            }
            CreateVerdict::Fail(e) => Err(e),
        }
    }

    async fn create_service(&self, manifest: &ServiceManifest) -> Result<ServiceManifest> {
        let namespace = manifest.metadata.namespace.as_deref().unwrap_or_default();
        let url = self.services_url(namespace, None);
        let response = self.http().post(&url).json(manifest).send().await?;

        self.handle_response(response).await
    }

    /// Replaces an existing service with a fresh manifest.
    ///
    /// The API server requires the live object's resource version on a
    /// replace, so the current one is fetched and carried over first.
    async fn replace_service(&self, mut manifest: ServiceManifest) -> Result<ServiceManifest> {
        let namespace = manifest
            .metadata
            .namespace
            .clone()
            .unwrap_or_default();
        let name = manifest.metadata.name.clone();

        let live = self.get_service(&namespace, &name).await?;
        manifest.metadata.resource_version = live.metadata.resource_version;

        let url = self.services_url(&namespace, Some(&name));
        let response = self.http().put(&url).json(&manifest).send().await?;
        let replaced: ServiceManifest = self
            .handle_response(response)
            .await
            .map_err(|e| {
                ClusterError::Deployment(format!(
                    "failed to replace service {}/{}: {}",
                    namespace, name, e
                ))
            })?;

        info!("Replaced service {}/{}", namespace, name);
        Ok(replaced)
    }

    /// Fetches a service by namespace and name
    pub async fn get_service(&self, namespace: &str, name: &str) -> Result<ServiceManifest> {
        let url = self.services_url(namespace, Some(name));
        let response = self.http().get(&url).send().await?;

        if response.status().as_u16() == 404 {
            return Err(ClusterError::NotFound(format!(
                "service {}/{}",
                namespace, name
            )));
        }
        self.handle_response(response).await
    }

    /// Lists all services in a namespace, reflecting orchestrator state at
    /// call time
    pub async fn list_services(&self, namespace: &str) -> Result<Vec<ServiceManifest>> {
        let url = self.services_url(namespace, None);
        let response = self.http().get(&url).send().await?;

        let list: ServiceList = self.handle_response(response).await?;
        Ok(list.items)
    }

    /// Resolves the public URL of a deployed service.
    ///
    /// The URL only exists once the orchestrator has reconciled the service
    /// to a ready revision; before that this fails with
    /// [`ClusterError::NotReady`] rather than a generic error.
    pub fn resolve_public_url(&self, manifest: &ServiceManifest) -> Result<String> {
        manifest
            .public_url()
            .map(|url| url.to_string())
            .ok_or_else(|| {
                ClusterError::NotReady(format!(
                    "service {}/{} has no URL yet",
                    manifest.metadata.namespace.as_deref().unwrap_or_default(),
                    manifest.metadata.name
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClusterClient;
    use crate::manifest::{ServiceStatus, StatusAddress};
    use anvil_core::domain::function::EnvVar;

    fn client() -> ClusterClient {
        ClusterClient::with_client("https://cluster.local", reqwest::Client::new())
    }

    fn descriptor() -> ServiceDescriptor {
        ServiceDescriptor {
            name: "hello".to_string(),
            namespace: "github-alice".to_string(),
            image: "registry.example.com/alice/hello".to_string(),
            env_vars: vec![EnvVar {
                key: "MODE".to_string(),
                value: "prod".to_string(),
            }],
        }
    }

    #[test]
    fn test_resolve_public_url_when_ready() {
        let mut manifest = ServiceManifest::from_descriptor(&descriptor());
        manifest.status = Some(ServiceStatus {
            url: Some("https://hello.github-alice.example.com".to_string()),
            ..Default::default()
        });

        let url = client().resolve_public_url(&manifest).unwrap();
        assert_eq!(url, "https://hello.github-alice.example.com");
    }

    #[test]
    fn test_resolve_public_url_falls_back_to_address() {
        let mut manifest = ServiceManifest::from_descriptor(&descriptor());
        manifest.status = Some(ServiceStatus {
            address: Some(StatusAddress {
                url: Some("http://hello.github-alice.svc".to_string()),
            }),
            ..Default::default()
        });

        let url = client().resolve_public_url(&manifest).unwrap();
        assert_eq!(url, "http://hello.github-alice.svc");
    }

    #[test]
    fn test_resolve_public_url_before_reconciliation() {
        let manifest = ServiceManifest::from_descriptor(&descriptor());
        assert!(matches!(
            client().resolve_public_url(&manifest),
            Err(ClusterError::NotReady(_))
        ));
    }

    #[test]
    fn test_fresh_service_is_created() {
        let manifest = ServiceManifest::from_descriptor(&descriptor());
        let verdict = after_create(Ok(manifest), "github-alice", "hello");
        assert!(matches!(
            verdict,
            CreateVerdict::Created(created) if created.metadata.name == "hello"
        ));
    }

    #[test]
    fn test_existing_service_moves_to_replace() {
        // Redeploying an existing function must not fail on the conflict
        let verdict = after_create(
            Err(ClusterError::api_error(
                409,
                "services.serving.knative.dev \"hello\" already exists",
            )),
            "github-alice",
            "hello",
        );
        assert!(matches!(verdict, CreateVerdict::ReplaceExisting));
    }

    #[test]
    fn test_create_failure_surfaces_as_deployment_error() {
        let verdict = after_create(
            Err(ClusterError::api_error(422, "spec.template is invalid")),
            "github-alice",
            "hello",
        );
        assert!(matches!(
            verdict,
            CreateVerdict::Fail(ClusterError::Deployment(_))
        ));
    }
}
