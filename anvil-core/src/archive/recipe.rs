//! Build recipe injection
//!
//! Rewrites a canonical build context so it carries exactly one build recipe
//! (`Dockerfile`) at the archive root. Every other entry is streamed through
//! unchanged; the input is never mutated in place.

use std::io::Read;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::domain::function::RuntimeFamily;
use crate::error::ArchiveError;

/// Name of the injected build recipe entry
pub const RECIPE_FILE_NAME: &str = "Dockerfile";

/// Permission bits of the injected recipe entry
const RECIPE_MODE: u32 = 0o644;

/// Appends the build recipe for `runtime` to a canonical build context.
///
/// Every input entry is copied into a fresh tar archive unchanged (header
/// plus content; content only exists for regular files), then one new
/// `Dockerfile` entry is appended at the archive root with the family's
/// fixed recipe body and a current timestamp.
///
/// A pre-existing entry named `Dockerfile` is replaced: the old entry is
/// dropped so the injected recipe is the only entry with that name.
///
/// The input must parse as a tar archive. It always does when it came from
/// the normalizer; anything else is an invariant violation reported as
/// [`ArchiveError::Rewrite`].
pub fn inject(context: &[u8], runtime: RuntimeFamily) -> Result<Vec<u8>, ArchiveError> {
    let mut archive = tar::Archive::new(context);
    let mut builder = tar::Builder::new(Vec::new());

    for entry in archive.entries().map_err(ArchiveError::Rewrite)? {
        let mut entry = entry.map_err(ArchiveError::Rewrite)?;
        let path = entry
            .path()
            .map_err(ArchiveError::Rewrite)?
            .into_owned();

        // Dropped here, re-created below with the injected body
        if path == std::path::Path::new(RECIPE_FILE_NAME) {
            continue;
        }

        let mut header = entry.header().clone();
        let mut content = Vec::new();
        if header.entry_type().is_file() {
            entry
                .read_to_end(&mut content)
                .map_err(ArchiveError::Rewrite)?;
        }
        builder
            .append_data(&mut header, &path, content.as_slice())
            .map_err(ArchiveError::Rewrite)?;
    }

    let body = runtime.recipe();
    let mut header = tar::Header::new_gnu();
    header.set_entry_type(tar::EntryType::Regular);
    header.set_mode(RECIPE_MODE);
    header.set_size(body.len() as u64);
    header.set_mtime(
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0),
    );
    builder
        .append_data(&mut header, RECIPE_FILE_NAME, body.as_bytes())
        .map_err(ArchiveError::Rewrite)?;

    builder.into_inner().map_err(ArchiveError::Rewrite)
}
