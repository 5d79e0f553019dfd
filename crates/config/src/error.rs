//! Config Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration loading.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The layered sources could not be merged into a [`Config`](crate::Config).
    #[display("could not load configuration")]
    Load,
    /// An explicitly requested config file does not exist.
    #[display("config file not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// Config file extension is not one of toml, yaml, yml or json.
    #[display("unsupported config file format: {}", _0.display())]
    UnsupportedFormat(#[error(not(source))] PathBuf),
    /// A value was parsed but is not acceptable.
    #[display("invalid configuration: {_0}")]
    Invalid(#[error(not(source))] &'static str),
    /// No home directory to derive platform directories from.
    #[display("could not determine platform directories")]
    NoProjectDirs,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
