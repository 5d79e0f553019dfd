//! Record Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Underlying causes (I/O errors, mime
//! sniffing failures) are attached as children of the error tree.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A record error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for record operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A required path argument was empty.
    #[display("no {_0} path provided")]
    MissingPath(#[error(not(source))] &'static str),
    /// Source path does not exist.
    #[display("path does not exist: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// Expected a regular file.
    #[display("path is not a file: {}", _0.display())]
    NotAFile(#[error(not(source))] PathBuf),
    /// Expected a directory.
    #[display("path is not a directory: {}", _0.display())]
    NotADirectory(#[error(not(source))] PathBuf),
    /// Target already exists; nothing is ever overwritten.
    #[display("target path already exists: {}", _0.display())]
    AlreadyExists(#[error(not(source))] PathBuf),
    /// Copying a bundle onto its own location.
    #[display("target path and current path are the same: {}", _0.display())]
    SameTarget(#[error(not(source))] PathBuf),
    /// Importing a folder into a location inside itself.
    #[display("target path is inside the source folder: {}", _0.display())]
    TargetInsideSource(#[error(not(source))] PathBuf),
    /// Path is not valid UTF-8, is empty, or escapes its root.
    #[display("invalid path: {}", _0.display())]
    InvalidPath(#[error(not(source))] PathBuf),
    /// Underlying I/O error on the given path.
    #[display("I/O error: {}", _0.display())]
    Io(#[error(not(source))] PathBuf),
    /// Mime type could not be resolved.
    #[display("could not resolve mime type: {}", _0.display())]
    Mime(#[error(not(source))] PathBuf),
    /// File content is not valid UTF-8 text.
    #[display("file is not valid UTF-8: {}", _0.display())]
    InvalidText(#[error(not(source))] PathBuf),
    /// A bundle member (by relative path) could not be read as text.
    #[display("could not read bundle file as text: {_0}")]
    UnreadableText(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` for failures caused by the arguments rather than by the
    /// environment. These are raised before any bytes are copied.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingPath(_)
                | Self::NotFound(_)
                | Self::NotAFile(_)
                | Self::NotADirectory(_)
                | Self::AlreadyExists(_)
                | Self::SameTarget(_)
                | Self::TargetInsideSource(_)
                | Self::InvalidPath(_)
        )
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Mime(_))
    }
}
