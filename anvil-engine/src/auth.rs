//! Registry credentials and auth token encoding
//!
//! Credentials are sourced from the environment on every pipeline run, so
//! the image reference a request resolves to always follows the registry
//! identity the process currently sees.

use anvil_core::domain::image::ImageReference;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;

use crate::error::EngineError;

/// Registry credentials used to publish images
///
/// Either a password or an identity token is carried, matching the two
/// registry auth modes. The identity token wins when both are configured.
#[derive(Debug, Clone)]
pub struct RegistryAuth {
    username: String,
    password: Option<String>,
    identity_token: Option<String>,
    server_address: String,
}

/// Wire shape of the auth config the engine expects in `X-Registry-Auth`
#[derive(Serialize)]
struct AuthConfig<'a> {
    username: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    identitytoken: Option<&'a str>,
    serveraddress: &'a str,
}

impl RegistryAuth {
    /// Reads credentials from the process environment.
    ///
    /// Expected environment variables:
    /// - DOCKER_REGISTRY (required, registry server address)
    /// - DOCKER_USERNAME (required)
    /// - DOCKER_PASSWORD or REGISTRY_IDENTITY_TOKEN (one required)
    pub fn from_env() -> Result<Self, EngineError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads credentials through an arbitrary lookup, mainly for tests
    pub fn from_lookup<F>(lookup: F) -> Result<Self, EngineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_address = lookup("DOCKER_REGISTRY")
            .map(sanitize)
            .filter(|v| !v.is_empty())
            .ok_or(EngineError::CredentialsMissing("DOCKER_REGISTRY"))?;
        let username = lookup("DOCKER_USERNAME")
            .map(sanitize)
            .filter(|v| !v.is_empty())
            .ok_or(EngineError::CredentialsMissing("DOCKER_USERNAME"))?;

        let identity_token = lookup("REGISTRY_IDENTITY_TOKEN")
            .map(sanitize)
            .filter(|v| !v.is_empty());
        let password = lookup("DOCKER_PASSWORD")
            .map(sanitize)
            .filter(|v| !v.is_empty());

        if identity_token.is_none() && password.is_none() {
            return Err(EngineError::CredentialsMissing("DOCKER_PASSWORD"));
        }

        Ok(Self {
            username,
            password,
            identity_token,
            server_address,
        })
    }

    /// Encodes the credentials into the token string sent with each push
    ///
    /// The engine expects the JSON auth config record in standard base64.
    pub fn encode(&self) -> Result<String, EngineError> {
        let config = match &self.identity_token {
            Some(token) => AuthConfig {
                username: &self.username,
                password: None,
                identitytoken: Some(token),
                serveraddress: &self.server_address,
            },
            None => AuthConfig {
                username: &self.username,
                password: self.password.as_deref(),
                identitytoken: None,
                serveraddress: &self.server_address,
            },
        };
        let json = serde_json::to_vec(&config)?;
        Ok(STANDARD.encode(json))
    }

    /// Derives the tenant-scoped image reference for a function name
    pub fn image_reference(&self, name: &str) -> ImageReference {
        ImageReference {
            registry_host: self.server_address.clone(),
            owner_segment: self.username.clone(),
            name: name.to_string(),
            tag: None,
        }
    }
}

/// Strips embedded line breaks that leak in from mounted secret files
fn sanitize(value: String) -> String {
    value.replace(['\n', '\r'], "")
}
