//! The archive: a directory that owns onboarded values.
//!
//! Every value gets its own directory below the root, named by its value id.
//! Saving copies a record into it and returns a [`LoadDescriptor`] that can
//! rebuild the record later.

mod descriptor;
pub mod error;
mod metadata;

pub use crate::descriptor::{LoadDescriptor, Loaded, load_bundle, load_file};
pub use crate::metadata::Metadata;

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use onboard_config::Config;
use onboard_records::{DEFAULT_CONCURRENCY, FileBundleRecord, FileRecord, ImportFilter, TextContents};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::instrument;

#[derive(Debug, Clone)]
pub struct Archive {
    root: PathBuf,
    include_original_path: bool,
    filter: ImportFilter,
    concurrency: usize,
}

impl Archive {
    /// Open the archive at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// [`InvalidRoot`](ErrorKind::InvalidRoot) if the path is not absolute or
    /// exists but is not a directory.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use onboard_archive::Archive;
    ///
    /// let archive = Archive::new("/absolute/path/to/archive")?;
    /// # Ok::<(), onboard_archive::error::Error>(())
    /// ```
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidRoot(root));
        }
        if root.exists() {
            if !root.is_dir() {
                exn::bail!(ErrorKind::InvalidRoot(root));
            }
        } else {
            fs::create_dir_all(&root).or_raise(|| ErrorKind::Io(root.clone()))?;
        }
        Ok(Self { root, include_original_path: true, filter: ImportFilter::default(), concurrency: DEFAULT_CONCURRENCY })
    }

    /// Open the archive described by `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let root = config.archive_root().or_raise(|| ErrorKind::Config)?;
        Ok(Self::new(root)?
            .with_include_original_path(config.include_original_path)
            .with_filter(config.filter.clone())
            .with_concurrency(config.concurrency))
    }

    /// Whether archived copies remember where their originals came from.
    pub fn with_include_original_path(mut self, include_original_path: bool) -> Self {
        self.include_original_path = include_original_path;
        self
    }

    /// Filter applied by [`import_folder`](Self::import_folder).
    pub fn with_filter(mut self, filter: ImportFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Bound on files hashed or read at the same time.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Onboard a file under `value_id`.
    ///
    /// The file is copied to `<root>/<value_id>/<file_name>`; on success the
    /// caller's record is re-homed there and marked as onboarded.
    ///
    /// # Errors
    ///
    /// [`InvalidValueId`](ErrorKind::InvalidValueId) unless the id is a single
    /// plain path component, and [`Save`](ErrorKind::Save) if the copy fails
    /// (including when the value already exists). The record is untouched on
    /// failure.
    #[instrument(skip_all, fields(value_id = %value_id, file = file.file_name()))]
    pub fn save_file(&self, file: &mut FileRecord, value_id: &str) -> Result<LoadDescriptor> {
        let base_path = self.value_dir(value_id)?;
        let target = base_path.join(file.file_name());
        let copy = file.copy_to(&target, self.include_original_path).or_raise(|| ErrorKind::Save(value_id.to_string()))?;
        file.mark_onboarded(copy.path());
        tracing::info!(path = %target.display(), "Onboarded file");
        Ok(LoadDescriptor::File { base_path, rel_path: file.file_name().to_string() })
    }

    /// Onboard a bundle under `value_id`.
    ///
    /// The folder is copied to `<root>/<value_id>/<bundle_name>`; on success
    /// the caller's bundle is re-homed there, its members are replaced by the
    /// archived copies, and the bundle and every member are marked as
    /// onboarded.
    #[instrument(skip_all, fields(value_id = %value_id, bundle = bundle.bundle_name()))]
    pub fn save_bundle(&self, bundle: &mut FileBundleRecord, value_id: &str) -> Result<LoadDescriptor> {
        let base_path = self.value_dir(value_id)?;
        let rel_path = bundle.bundle_name().to_string();
        let target = base_path.join(&rel_path);
        let copy =
            bundle.copy_to(&target, self.include_original_path).or_raise(|| ErrorKind::Save(value_id.to_string()))?;
        let path = copy.path().to_path_buf();
        bundle.mark_onboarded(path, copy.into_included_files());
        tracing::info!(path = %target.display(), files = bundle.file_count(), "Onboarded bundle");
        // The archived folder holds exactly the members that passed the
        // import filter; loading must not filter them again.
        Ok(LoadDescriptor::FileBundle { base_path, rel_path, filter: ImportFilter::none() })
    }

    /// Snapshot the folder at `source` in place, with the archive's filter.
    pub fn import_folder(&self, source: impl AsRef<Path>) -> Result<FileBundleRecord> {
        let source = source.as_ref();
        FileBundleRecord::import_folder(source, None, &self.filter, self.include_original_path)
            .or_raise(|| ErrorKind::Import(source.to_path_buf()))
    }

    /// Hash a bundle, hashing at most `concurrency` members at a time.
    pub async fn bundle_hash(&self, bundle: &FileBundleRecord) -> Result<String> {
        let hash = bundle
            .bundle_hash_concurrent(self.concurrency)
            .await
            .or_raise(|| ErrorKind::Hash(bundle.path().to_path_buf()))?;
        Ok(hash.to_string())
    }

    /// Read a bundle's members as text, at most `concurrency` at a time.
    pub async fn read_text(&self, bundle: &FileBundleRecord, ignore_errors: bool) -> Result<TextContents> {
        bundle
            .read_text_file_contents(ignore_errors, self.concurrency)
            .await
            .or_raise(|| ErrorKind::ReadText(bundle.path().to_path_buf()))
    }

    fn value_dir(&self, value_id: &str) -> Result<PathBuf> {
        let mut components = Path::new(value_id).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) if !value_id.contains('\0') => Ok(self.root.join(name)),
            _ => exn::bail!(ErrorKind::InvalidValueId(value_id.to_string())),
        }
    }
}
