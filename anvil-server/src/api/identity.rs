//! Caller identity extraction
//!
//! Identity is attached upstream of this service; it arrives here as opaque
//! `username`/`provider` strings carried in request headers. This layer only
//! uses them to resolve the tenant namespace.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::api::error::ApiError;

/// Header carrying the authenticated username
pub const USERNAME_HEADER: &str = "x-auth-username";

/// Header carrying the identity provider name
pub const PROVIDER_HEADER: &str = "x-auth-provider";

/// Opaque tenant identity of the caller
#[derive(Debug, Clone)]
pub struct Identity {
    pub username: String,
    pub provider: String,
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let username = header_string(parts, USERNAME_HEADER);
        let provider = header_string(parts, PROVIDER_HEADER);

        if username.is_empty() {
            return Err(ApiError::BadRequest("username is required".to_string()));
        }

        Ok(Identity { username, provider })
    }
}

fn header_string(parts: &Parts, name: &str) -> String {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
