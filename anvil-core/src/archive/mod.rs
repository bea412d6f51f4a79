//! Archive Handling
//!
//! Turns an arbitrary uploaded archive into a build context the build engine
//! accepts: a tar byte stream with a build recipe at its root.
//!
//! The flow is strictly forward: raw upload bytes -> canonical tar
//! ([`normalize`]) -> recipe-augmented tar ([`inject`]). Each step either
//! produces a complete archive or fails; partial archives are never returned.

pub mod normalize;
pub mod recipe;

pub use normalize::normalize;
pub use recipe::{RECIPE_FILE_NAME, inject};
