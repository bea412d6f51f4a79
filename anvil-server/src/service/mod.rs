//! Service Module
//!
//! Business logic layer for the deployment server. The deployment service
//! owns the pipeline that turns an uploaded archive into a running service.

pub mod deployment;

// Re-export for convenience
pub use deployment as deployment_service;
