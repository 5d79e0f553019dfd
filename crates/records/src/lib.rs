pub mod bundle;
mod copy;
pub mod error;
pub mod file;
mod filter;
mod hash;
mod path;
mod read;

pub use crate::bundle::FileBundleRecord;
pub use crate::file::FileRecord;
pub use crate::filter::{DEFAULT_EXCLUDE_FILE_SUFFIXES, ImportFilter, should_include};
pub use crate::hash::CHUNK_SIZE;
pub use crate::path::relative_location;
pub use crate::read::{SkippedFile, TextContents};

/// Default bound on concurrent per-file work (hashing, text reads).
pub const DEFAULT_CONCURRENCY: usize = 8;
