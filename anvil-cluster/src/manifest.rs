//! Typed resource manifests
//!
//! The orchestrator's wire format is generic JSON. Each resource kind the
//! pipeline touches gets an explicit typed schema here, with a field for
//! every path the pipeline reads or writes (`metadata.name`,
//! `spec.template.spec.containers[0].image`, `status.url`,
//! `status.address.url`); serde does the conversion at the boundary.

use anvil_core::domain::service::ServiceDescriptor;
use serde::{Deserialize, Serialize};

/// API version of the serving resource group
pub const SERVING_API_VERSION: &str = "serving.knative.dev/v1";

/// Object metadata common to all manifests
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Concurrency token required by the API server when replacing an object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,
}

/// A cluster-scoped tenant namespace
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceManifest {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
}

impl NamespaceManifest {
    /// Builds the manifest for a new namespace
    pub fn new(name: &str) -> Self {
        Self {
            api_version: "v1".to_string(),
            kind: "Namespace".to_string(),
            metadata: ObjectMeta {
                name: name.to_string(),
                ..Default::default()
            },
        }
    }
}

/// A namespace-scoped serving service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceManifest {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: ServiceSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ServiceStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceSpec {
    pub template: Template,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Template {
    pub spec: TemplateSpec,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateSpec {
    pub containers: Vec<Container>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Container {
    pub image: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<ContainerEnvVar>,
}

/// Container environment variable in the orchestrator's wire shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerEnvVar {
    pub name: String,
    pub value: String,
}

/// Orchestrator-assigned status, populated as the service reconciles
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub address: Option<StatusAddress>,
    #[serde(default)]
    pub conditions: Vec<StatusCondition>,
    #[serde(default)]
    pub latest_ready_revision_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusAddress {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCondition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: String,
    #[serde(default)]
    pub reason: Option<String>,
}

/// List response for namespace-scoped services
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceList {
    #[serde(default)]
    pub items: Vec<ServiceManifest>,
}

impl ServiceManifest {
    /// Builds the declarative manifest for a service descriptor
    pub fn from_descriptor(descriptor: &ServiceDescriptor) -> Self {
        Self {
            api_version: SERVING_API_VERSION.to_string(),
            kind: "Service".to_string(),
            metadata: ObjectMeta {
                name: descriptor.name.clone(),
                namespace: Some(descriptor.namespace.clone()),
                resource_version: None,
            },
            spec: ServiceSpec {
                template: Template {
                    spec: TemplateSpec {
                        containers: vec![Container {
                            image: descriptor.image.clone(),
                            env: descriptor
                                .env_vars
                                .iter()
                                .map(|var| ContainerEnvVar {
                                    name: var.key.clone(),
                                    value: var.value.clone(),
                                })
                                .collect(),
                        }],
                    },
                },
            },
            status: None,
        }
    }

    /// Extracts the snapshot view the pipeline works with
    pub fn to_descriptor(&self) -> ServiceDescriptor {
        let container = self.spec.template.spec.containers.first();
        ServiceDescriptor {
            name: self.metadata.name.clone(),
            namespace: self.metadata.namespace.clone().unwrap_or_default(),
            image: container.map(|c| c.image.clone()).unwrap_or_default(),
            env_vars: container
                .map(|c| {
                    c.env
                        .iter()
                        .map(|var| anvil_core::domain::function::EnvVar {
                            key: var.name.clone(),
                            value: var.value.clone(),
                        })
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    /// The service's public URL, if the orchestrator has reconciled it
    ///
    /// Reads `status.url` first, falling back to `status.address.url`.
    pub fn public_url(&self) -> Option<&str> {
        let status = self.status.as_ref()?;
        status
            .url
            .as_deref()
            .filter(|url| !url.is_empty())
            .or_else(|| {
                status
                    .address
                    .as_ref()
                    .and_then(|address| address.url.as_deref())
                    .filter(|url| !url.is_empty())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anvil_core::domain::function::EnvVar;

    fn descriptor() -> ServiceDescriptor {
        ServiceDescriptor {
            name: "hello".to_string(),
            namespace: "github-alice".to_string(),
            image: "registry.example.com/alice/hello".to_string(),
            env_vars: vec![EnvVar {
                key: "LOG_LEVEL".to_string(),
                value: "debug".to_string(),
            }],
        }
    }

    #[test]
    fn test_manifest_wire_shape() {
        let manifest = ServiceManifest::from_descriptor(&descriptor());
        let value = serde_json::to_value(&manifest).unwrap();

        assert_eq!(value["apiVersion"], "serving.knative.dev/v1");
        assert_eq!(value["kind"], "Service");
        assert_eq!(value["metadata"]["name"], "hello");
        assert_eq!(value["metadata"]["namespace"], "github-alice");
        assert_eq!(
            value["spec"]["template"]["spec"]["containers"][0]["image"],
            "registry.example.com/alice/hello"
        );
        assert_eq!(
            value["spec"]["template"]["spec"]["containers"][0]["env"][0]["name"],
            "LOG_LEVEL"
        );
        // Not set on submission; the API server owns it
        assert!(value["metadata"].get("resourceVersion").is_none());
        assert!(value.get("status").is_none());
    }

    #[test]
    fn test_descriptor_round_trip() {
        let manifest = ServiceManifest::from_descriptor(&descriptor());
        let back = manifest.to_descriptor();
        assert_eq!(back.name, "hello");
        assert_eq!(back.namespace, "github-alice");
        assert_eq!(back.image, "registry.example.com/alice/hello");
        assert_eq!(back.env_vars.len(), 1);
    }

    #[test]
    fn test_public_url_prefers_top_level_status() {
        let mut manifest = ServiceManifest::from_descriptor(&descriptor());
        manifest.status = Some(ServiceStatus {
            url: Some("https://hello.github-alice.example.com".to_string()),
            address: Some(StatusAddress {
                url: Some("http://hello.github-alice.svc.cluster.local".to_string()),
            }),
            ..Default::default()
        });

        assert_eq!(
            manifest.public_url(),
            Some("https://hello.github-alice.example.com")
        );
    }

    #[test]
    fn test_public_url_falls_back_to_address() {
        let mut manifest = ServiceManifest::from_descriptor(&descriptor());
        manifest.status = Some(ServiceStatus {
            url: Some(String::new()),
            address: Some(StatusAddress {
                url: Some("http://hello.github-alice.svc.cluster.local".to_string()),
            }),
            ..Default::default()
        });

        assert_eq!(
            manifest.public_url(),
            Some("http://hello.github-alice.svc.cluster.local")
        );
    }

    #[test]
    fn test_public_url_absent_before_reconciliation() {
        let mut manifest = ServiceManifest::from_descriptor(&descriptor());
        assert_eq!(manifest.public_url(), None);

        manifest.status = Some(ServiceStatus::default());
        assert_eq!(manifest.public_url(), None);
    }

    #[test]
    fn test_status_parses_from_wire_json() {
        let wire = serde_json::json!({
            "apiVersion": "serving.knative.dev/v1",
            "kind": "Service",
            "metadata": {
                "name": "hello",
                "namespace": "github-alice",
                "resourceVersion": "12345"
            },
            "spec": {
                "template": { "spec": { "containers": [ { "image": "img" } ] } }
            },
            "status": {
                "url": "https://hello.example.com",
                "conditions": [
                    { "type": "Ready", "status": "True" }
                ],
                "latestReadyRevisionName": "hello-00002"
            }
        });

        let manifest: ServiceManifest = serde_json::from_value(wire).unwrap();
        assert_eq!(
            manifest.metadata.resource_version.as_deref(),
            Some("12345")
        );
        assert_eq!(manifest.public_url(), Some("https://hello.example.com"));
        let status = manifest.status.unwrap();
        assert_eq!(status.conditions[0].condition_type, "Ready");
        assert_eq!(
            status.latest_ready_revision_name.as_deref(),
            Some("hello-00002")
        );
    }
}
