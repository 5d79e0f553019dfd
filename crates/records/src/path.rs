//! Bundle keys and archive-relative locations.
//!
//! Bundle members are keyed by their path relative to the bundle root,
//! rendered POSIX-style (`/` separated) regardless of platform so that
//! bundle hashes agree across operating systems.

use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use std::path::{Component, Path, PathBuf};

/// Location of an archived value below its value directory.
///
/// Load descriptors name what they load by a path relative to a base
/// directory. Only plain names are accepted, so the result can never point
/// outside the base: `..`, absolute paths, drive prefixes, NUL bytes and empty
/// paths are all [`InvalidPath`](ErrorKind::InvalidPath). `.` components and
/// trailing separators are dropped.
///
/// # Examples
///
/// ```
/// use onboard_records::relative_location;
/// use std::path::Path;
///
/// assert_eq!(relative_location("dataset/./nested/").unwrap(), Path::new("dataset/nested"));
/// assert!(relative_location("../other-value/report.csv").is_err());
/// assert!(relative_location("/etc/passwd").is_err());
/// ```
pub fn relative_location(rel_path: &str) -> Result<PathBuf> {
    if rel_path.contains('\0') {
        exn::bail!(ErrorKind::InvalidPath(PathBuf::from(rel_path)));
    }
    relative_key(Path::new(rel_path)).map(PathBuf::from)
}

/// Render a relative path as a POSIX-style bundle key.
///
/// Fails on non-UTF-8 components and on anything that isn't a plain
/// relative path (roots, prefixes, `..`).
pub(crate) fn relative_key(relative: &Path) -> Result<String> {
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(s) => {
                parts.push(s.to_str().ok_or_raise(|| ErrorKind::InvalidPath(relative.to_path_buf()))?)
            },
            Component::CurDir => {},
            _ => exn::bail!(ErrorKind::InvalidPath(relative.to_path_buf())),
        }
    }
    if parts.is_empty() {
        exn::bail!(ErrorKind::InvalidPath(relative.to_path_buf()));
    }
    Ok(parts.join("/"))
}

/// Base name of a path as a UTF-8 string.
pub(crate) fn file_name(path: &Path) -> Result<String> {
    Ok(path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_raise(|| ErrorKind::InvalidPath(path.to_path_buf()))?
        .to_string())
}

/// Absolute form of `path` without resolving symlinks, with trailing
/// separators and `.` components removed.
pub(crate) fn absolute(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path).or_raise(|| ErrorKind::InvalidPath(path.to_path_buf()))?;
    Ok(absolute.components().collect())
}
