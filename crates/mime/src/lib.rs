//! Mime type resolution for imported files.
//!
//! Resolution happens in a fixed order:
//!
//! 1. **Extension table** ([`from_path`]): a lookup on the lowercased file
//!    extension.
//! 2. **Content sniffing** ([`from_magic_bytes`], [`sniff_file`]): only
//!    consulted when the extension is missing or unknown; reads the first
//!    [`SNIFF_LENGTH`] bytes of the file and compares them against known
//!    signatures.
//! 3. **Fallback** to [`OCTET_STREAM`].
//!
//! [`detect`] runs all three steps.

pub mod error;
mod extension;
mod magic;

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::instrument;

pub use crate::extension::from_path;
pub use crate::magic::{SNIFF_LENGTH, from_magic_bytes};

/// Mime type used when neither the extension nor the content is recognised.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Read the head of a file and match it against known signatures.
///
/// Returns `Ok(None)` when the content matches nothing (including empty
/// files). Fails only if the file cannot be opened or read.
pub fn sniff_file(path: impl AsRef<Path>) -> Result<Option<&'static str>> {
    let path = path.as_ref();
    let file = File::open(path).or_raise(|| ErrorKind::Io(path.to_path_buf()))?;
    let mut head = Vec::with_capacity(SNIFF_LENGTH);
    file.take(SNIFF_LENGTH as u64)
        .read_to_end(&mut head)
        .or_raise(|| ErrorKind::Io(path.to_path_buf()))?;
    Ok(from_magic_bytes(&head))
}

/// Resolve the mime type of the file at `path`.
///
/// # Examples
///
/// ```no_run
/// let mime = onboard_mime::detect("/data/report.csv").unwrap();
/// assert_eq!(mime, "text/csv");
/// ```
#[instrument(level = "trace", skip_all, fields(path = %path.as_ref().display()))]
pub fn detect(path: impl AsRef<Path>) -> Result<&'static str> {
    let path = path.as_ref();
    if let Some(mime) = from_path(path) {
        return Ok(mime);
    }
    match sniff_file(path)? {
        Some(mime) => {
            tracing::trace!(mime, "mime type resolved from content");
            Ok(mime)
        },
        None => Ok(OCTET_STREAM),
    }
}
