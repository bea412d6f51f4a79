//! Image reference domain type

use std::fmt;

use serde::{Deserialize, Serialize};

/// Fully qualified reference to a container image in a registry
///
/// Serialized as `host/owner/name[:tag]`. References are derived from the
/// registry credentials plus the function name each time a pipeline runs,
/// never persisted: the same function name under different registry
/// credentials yields a different image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageReference {
    /// Registry server address (e.g. "registry.example.com")
    pub registry_host: String,
    /// Tenant-scoped path segment, typically the registry username
    pub owner_segment: String,
    /// Image name, identical to the function name
    pub name: String,
    /// Optional tag; the engine defaults to "latest" when absent
    pub tag: Option<String>,
}

impl ImageReference {
    /// The repository part of the reference: `host/owner/name`, without a tag
    pub fn repository(&self) -> String {
        format!("{}/{}/{}", self.registry_host, self.owner_segment, self.name)
    }

    /// The tag to push, defaulting to "latest"
    pub fn tag_or_default(&self) -> &str {
        self.tag.as_deref().unwrap_or("latest")
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tag {
            Some(tag) => write!(f, "{}:{}", self.repository(), tag),
            None => write!(f, "{}", self.repository()),
        }
    }
}
