//! Anvil Core
//!
//! Core types and archive handling for the Anvil function deployment platform.
//!
//! This crate contains:
//! - Domain types: Core business entities (DeploymentRequest, ImageReference, etc.)
//! - DTOs: Data transfer objects for the HTTP surface
//! - Archive handling: build-context normalization and build-recipe injection

pub mod archive;
pub mod domain;
pub mod dto;
pub mod error;

pub use error::{ArchiveError, ValidationError};
