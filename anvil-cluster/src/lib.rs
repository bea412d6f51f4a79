//! Anvil Cluster Client
//!
//! A type-safe HTTP client for the orchestrator's resource API. Two resource
//! kinds are used: cluster-scoped tenant namespaces and namespace-scoped
//! serving services. Manifests are typed ([`manifest`]); generic wire JSON
//! exists only at the serde boundary.

pub mod error;
pub mod manifest;
mod namespace;
mod service;

pub use error::{ClusterError, Result};
pub use namespace::resolve_name;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;

/// Configuration for the orchestrator connection
///
/// Expected environment variables:
/// - CLUSTER_API_URL (optional, default: "https://kubernetes.default.svc")
/// - CLUSTER_TOKEN (optional bearer token)
/// - CLUSTER_INSECURE_TLS (optional, "true" to accept self-signed certs)
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    pub api_url: String,
    pub bearer_token: Option<String>,
    pub accept_invalid_certs: bool,
}

impl ClusterConfig {
    /// Reads the configuration from the process environment
    pub fn from_env() -> Self {
        Self {
            api_url: std::env::var("CLUSTER_API_URL")
                .unwrap_or_else(|_| "https://kubernetes.default.svc".to_string()),
            bearer_token: std::env::var("CLUSTER_TOKEN").ok().filter(|t| !t.is_empty()),
            accept_invalid_certs: std::env::var("CLUSTER_INSECURE_TLS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }
}

/// HTTP client for the orchestrator resource API
///
/// Constructed once at startup and shared read-only for the process
/// lifetime.
#[derive(Debug, Clone)]
pub struct ClusterClient {
    /// Base URL of the API server
    base_url: String,
    /// HTTP client instance
    client: reqwest::Client,
}

impl ClusterClient {
    /// Create a new cluster client from configuration
    pub fn new(config: &ClusterConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();

        if let Some(token) = &config.bearer_token {
            let mut headers = HeaderMap::new();
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ClusterError::Parse(format!("invalid bearer token: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
            builder = builder.default_headers(headers);
        }
        if config.accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }

        Ok(Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            client: builder.build()?,
        })
    }

    /// Create a cluster client with a pre-built HTTP client
    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the API server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.client
    }

    /// URL for the cluster-scoped namespaces resource
    pub(crate) fn namespaces_url(&self, name: Option<&str>) -> String {
        match name {
            Some(name) => format!("{}/api/v1/namespaces/{}", self.base_url, name),
            None => format!("{}/api/v1/namespaces", self.base_url),
        }
    }

    /// URL for the namespace-scoped serving services resource
    pub(crate) fn services_url(&self, namespace: &str, name: Option<&str>) -> String {
        let base = format!(
            "{}/apis/serving.knative.dev/v1/namespaces/{}/services",
            self.base_url, namespace
        );
        match name {
            Some(name) => format!("{}/{}", base, name),
            None => base,
        }
    }

    /// Handle an API response and deserialize JSON
    ///
    /// Checks the status code and returns an appropriate error if the
    /// request failed, or deserializes the response body if successful.
    pub(crate) async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClusterError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClusterError::Parse(format!("Failed to parse JSON response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = ClusterClient::with_client("https://cluster.local/", reqwest::Client::new());
        assert_eq!(client.base_url(), "https://cluster.local");
    }

    #[test]
    fn test_resource_urls() {
        let client = ClusterClient::with_client("https://cluster.local", reqwest::Client::new());

        assert_eq!(
            client.namespaces_url(None),
            "https://cluster.local/api/v1/namespaces"
        );
        assert_eq!(
            client.namespaces_url(Some("github-alice")),
            "https://cluster.local/api/v1/namespaces/github-alice"
        );
        assert_eq!(
            client.services_url("github-alice", None),
            "https://cluster.local/apis/serving.knative.dev/v1/namespaces/github-alice/services"
        );
        assert_eq!(
            client.services_url("github-alice", Some("hello")),
            "https://cluster.local/apis/serving.knative.dev/v1/namespaces/github-alice/services/hello"
        );
    }
}
