//! Error types for archive handling and request validation

use thiserror::Error;

/// Errors produced while turning an uploaded archive into a build context
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The upload was recognized but is not a supported container format
    #[error("unsupported archive format: {media_type}")]
    UnsupportedFormat {
        /// Media type detected from the magic bytes
        media_type: String,
    },

    /// The upload could not be classified at all
    #[error("unrecognized archive format")]
    Unrecognized,

    /// An archive entry is neither a regular file nor a directory
    #[error("unsupported entry type for {name}")]
    UnsupportedEntry {
        /// Path of the offending entry
        name: String,
    },

    /// Failed to read the uploaded archive
    #[error("failed to read archive: {0}")]
    Read(#[from] std::io::Error),

    /// Failed to parse the uploaded zip container
    #[error("failed to read zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Failed to rewrite a build context during recipe injection
    #[error("failed to rewrite build context: {0}")]
    Rewrite(std::io::Error),
}

/// Errors produced while validating a deployment request
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field was empty
    #[error("{0} is required")]
    MissingField(&'static str),

    /// The function name cannot be used as a resource identifier
    #[error("invalid function name {name:?}: {reason}")]
    InvalidName {
        /// The rejected name
        name: String,
        /// Why the name was rejected
        reason: &'static str,
    },

    /// The declared runtime has no known build recipe
    #[error("unsupported runtime {0:?}")]
    UnsupportedRuntime(String),
}
