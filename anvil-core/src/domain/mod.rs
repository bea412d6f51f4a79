//! Domain types shared between server and client crates

pub mod function;
pub mod image;
pub mod service;

pub use function::{DeploymentRequest, DeploymentResult, EnvVar, RuntimeFamily};
pub use image::ImageReference;
pub use service::ServiceDescriptor;
