//! Archive Error Types
//!
//! Failures from the record and config crates are attached as children of
//! the error tree; the kinds here say which archive operation they broke.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// An archive error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for archive operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Archive root must be an absolute path to a directory.
    #[display("invalid archive root: {}", _0.display())]
    InvalidRoot(#[error(not(source))] PathBuf),
    /// Value ids name exactly one directory below the archive root.
    #[display("invalid value id: {_0:?}")]
    InvalidValueId(#[error(not(source))] String),
    /// A relative path in a load descriptor is empty or escapes its base.
    #[display("invalid relative path: {_0:?}")]
    InvalidPath(#[error(not(source))] String),
    /// Underlying I/O error on the given path.
    #[display("I/O error: {}", _0.display())]
    Io(#[error(not(source))] PathBuf),
    /// Configuration could not be loaded or resolved.
    #[display("configuration error")]
    Config,
    /// Onboarding the value with this id failed.
    #[display("could not save value: {_0}")]
    Save(#[error(not(source))] String),
    /// Rebuilding a record from the archive failed.
    #[display("could not load value from: {}", _0.display())]
    Load(#[error(not(source))] PathBuf),
    /// Importing a folder into a bundle record failed.
    #[display("could not import: {}", _0.display())]
    Import(#[error(not(source))] PathBuf),
    /// Hashing the members of a bundle failed.
    #[display("could not hash bundle: {}", _0.display())]
    Hash(#[error(not(source))] PathBuf),
    /// Reading the members of a bundle as text failed.
    #[display("could not read bundle as text: {}", _0.display())]
    ReadText(#[error(not(source))] PathBuf),
    /// Records could not be projected to JSON.
    #[display("could not serialize metadata")]
    Metadata,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}
