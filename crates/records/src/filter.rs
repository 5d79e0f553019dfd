//! Folder import filter policy.

use serde::{Deserialize, Serialize};

/// File name suffixes excluded from folder imports unless the caller says
/// otherwise: OS junk and editor leftovers.
pub const DEFAULT_EXCLUDE_FILE_SUFFIXES: &[&str] =
    &[".DS_Store", "Thumbs.db", "ehthumbs.db", "desktop.ini", ".directory", ".swp", "~"];

/// Decide whether a file name passes the import filter.
///
/// Exclusion always wins. Without an include list (or with an empty one)
/// everything not excluded is included.
///
/// ```
/// use onboard_records::should_include;
///
/// let include = [".txt".to_string()];
/// let exclude = [".tmp.txt".to_string()];
/// assert!(should_include("notes.txt", Some(&include), Some(&exclude)));
/// assert!(!should_include("notes.tmp.txt", Some(&include), Some(&exclude)));
/// assert!(!should_include("data.csv", Some(&include), None));
/// assert!(should_include("data.csv", None, None));
/// ```
#[must_use]
pub fn should_include(filename: &str, include_suffixes: Option<&[String]>, exclude_suffixes: Option<&[String]>) -> bool {
    if exclude_suffixes.is_some_and(|suffixes| suffixes.iter().any(|suffix| filename.ends_with(suffix.as_str()))) {
        return false;
    }
    match include_suffixes {
        Some(suffixes) if !suffixes.is_empty() => suffixes.iter().any(|suffix| filename.ends_with(suffix.as_str())),
        _ => true,
    }
}

/// Which entries of a folder tree are imported into a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportFilter {
    /// Only include files whose name ends with one of these.
    pub include_suffixes: Option<Vec<String>>,
    /// Directory names (exact match) pruned from the walk; nothing below them
    /// is visited.
    pub exclude_dir_names: Option<Vec<String>>,
    /// Exclude files whose name ends with one of these. Takes precedence over
    /// `include_suffixes`.
    pub exclude_file_suffixes: Option<Vec<String>>,
}
impl Default for ImportFilter {
    fn default() -> Self {
        Self {
            include_suffixes: None,
            exclude_dir_names: None,
            exclude_file_suffixes: Some(DEFAULT_EXCLUDE_FILE_SUFFIXES.iter().map(|s| s.to_string()).collect()),
        }
    }
}
impl ImportFilter {
    /// A filter that lets everything through.
    pub fn none() -> Self {
        Self { include_suffixes: None, exclude_dir_names: None, exclude_file_suffixes: None }
    }

    pub fn with_include_suffixes<S: Into<String>>(mut self, suffixes: impl IntoIterator<Item = S>) -> Self {
        self.include_suffixes = Some(suffixes.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_exclude_dir_names<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.exclude_dir_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_exclude_file_suffixes<S: Into<String>>(mut self, suffixes: impl IntoIterator<Item = S>) -> Self {
        self.exclude_file_suffixes = Some(suffixes.into_iter().map(Into::into).collect());
        self
    }

    /// Whether a file with this name is imported.
    #[must_use]
    pub fn includes_file(&self, filename: &str) -> bool {
        should_include(filename, self.include_suffixes.as_deref(), self.exclude_file_suffixes.as_deref())
    }

    /// Whether a directory with this name is skipped along with its contents.
    #[must_use]
    pub fn prunes_dir(&self, dirname: &str) -> bool {
        self.exclude_dir_names.as_deref().is_some_and(|names| names.iter().any(|name| name == dirname))
    }
}
