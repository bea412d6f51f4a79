//! Deployment Pipeline
//!
//! Sequences a single deployment request through its stages:
//!
//! ```text
//! Validated -> Normalized -> RecipeInjected -> Built -> Published
//!           -> NamespaceReady -> Deployed
//! ```
//!
//! The pipeline is linear with no back-edges: each stage either hands its
//! output to the next or fails the whole request. A stage failure is
//! terminal and performs no rollback of earlier stages; in particular, a
//! published image whose deploy step fails stays published.

use thiserror::Error;
use tracing::info;

use anvil_cluster::ClusterError;
use anvil_core::archive;
use anvil_core::domain::function::{DeploymentRequest, DeploymentResult, RuntimeFamily};
use anvil_core::domain::service::ServiceDescriptor;
use anvil_core::dto::FunctionView;
use anvil_core::error::{ArchiveError, ValidationError};
use anvil_engine::{EngineError, RegistryAuth};

use crate::state::AppState;

/// Pipeline error, carrying the failing stage's name
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("request validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("{stage} failed: {source}")]
    Archive {
        stage: &'static str,
        source: ArchiveError,
    },

    #[error("{stage} failed: {source}")]
    Engine {
        stage: &'static str,
        source: EngineError,
    },

    #[error("{stage} failed: {source}")]
    Cluster {
        stage: &'static str,
        source: ClusterError,
    },
}

impl DeployError {
    fn archive(stage: &'static str) -> impl FnOnce(ArchiveError) -> Self {
        move |source| Self::Archive { stage, source }
    }

    fn engine(stage: &'static str) -> impl FnOnce(EngineError) -> Self {
        move |source| Self::Engine { stage, source }
    }

    fn cluster(stage: &'static str) -> impl FnOnce(ClusterError) -> Self {
        move |source| Self::Cluster { stage, source }
    }
}

/// Runs the full deployment pipeline for one request.
///
/// The request is owned by this execution; concurrent requests from other
/// callers run their own pipelines. Two concurrent deployments of the same
/// (tenant, name) race without locking: last writer wins on both the image
/// tag and the service descriptor.
pub async fn deploy_function(
    state: &AppState,
    username: &str,
    provider: &str,
    request: DeploymentRequest,
) -> Result<DeploymentResult, DeployError> {
    // Validated
    request.validate()?;
    let runtime = RuntimeFamily::parse(&request.runtime)?;

    info!(
        "Deploying function {} (runtime {}) for {}/{}",
        request.name, request.runtime, provider, username
    );

    // Normalized
    let context = archive::normalize(&request.archive)
        .map_err(DeployError::archive("archive normalization"))?;

    // RecipeInjected
    let context =
        archive::inject(&context, runtime).map_err(DeployError::archive("recipe injection"))?;

    // Registry identity is environment-sourced and re-read per request, so
    // the image reference always follows the current credentials
    let auth = RegistryAuth::from_env().map_err(DeployError::engine("image publish"))?;
    let image = auth.image_reference(&request.name);

    // Built
    state
        .engine
        .build_image(context, &image)
        .await
        .map_err(DeployError::engine("image build"))?;

    // Published
    state
        .engine
        .push_image(&image, &auth)
        .await
        .map_err(DeployError::engine("image publish"))?;

    // NamespaceReady
    let namespace = state
        .cluster
        .get_or_create_namespace(username, provider)
        .await
        .map_err(DeployError::cluster("namespace provisioning"))?;

    // Deployed
    let descriptor = ServiceDescriptor {
        name: request.name.clone(),
        namespace,
        image: image.to_string(),
        env_vars: request.env_vars.clone(),
    };
    state
        .cluster
        .deploy_service(&descriptor)
        .await
        .map_err(DeployError::cluster("service deployment"))?;

    info!("Function {} deployed", request.name);

    Ok(DeploymentResult {
        image_reference: image.to_string(),
        service_name: request.name.clone(),
        message: format!("Service {} successfully deployed", request.name),
    })
}

/// Fetches one deployed function for a tenant
pub async fn get_function(
    state: &AppState,
    username: &str,
    provider: &str,
    name: &str,
) -> Result<FunctionView, DeployError> {
    let namespace = anvil_cluster::resolve_name(username, provider);
    let manifest = state
        .cluster
        .get_service(&namespace, name)
        .await
        .map_err(DeployError::cluster("service lookup"))?;

    Ok(view_from_manifest(&manifest))
}

/// Lists a tenant's deployed functions.
///
/// An empty list is reported as not-found rather than an empty success;
/// callers rely on that distinction.
pub async fn list_functions(
    state: &AppState,
    username: &str,
    provider: &str,
) -> Result<Vec<FunctionView>, DeployError> {
    let namespace = anvil_cluster::resolve_name(username, provider);
    let manifests = state
        .cluster
        .list_services(&namespace)
        .await
        .map_err(DeployError::cluster("service listing"))?;

    if manifests.is_empty() {
        return Err(DeployError::Cluster {
            stage: "service listing",
            source: ClusterError::NotFound(format!("no functions in namespace {}", namespace)),
        });
    }

    Ok(manifests.iter().map(view_from_manifest).collect())
}

fn view_from_manifest(manifest: &anvil_cluster::manifest::ServiceManifest) -> FunctionView {
    let descriptor = manifest.to_descriptor();
    FunctionView {
        name: descriptor.name,
        namespace: descriptor.namespace,
        image: descriptor.image,
        url: manifest.public_url().map(|url| url.to_string()),
    }
}
