//! Single-file records.

use crate::copy::copy_new;
use crate::error::{ErrorKind, Result};
use crate::hash::{hash_async_reader, hash_reader};
use crate::path;
use exn::ResultExt;
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::fs::{self, File};
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tracing::instrument;

/// One file, either referenced where it was found or owned by the archive.
///
/// Identity fields (`original_filename`, `original_path`, `import_timestamp`,
/// `file_name`) are fixed at import and survive [copies](Self::copy_to). The
/// only in-place changes a record ever sees are memoizing its content hash
/// and being [marked as onboarded](Self::mark_onboarded).
///
/// # Integrity caveat
/// The content hash is computed once and then trusted. Copies carry it
/// forward verbatim instead of re-reading the copied bytes, so if the bytes at
/// [`path`](Self::path) are modified behind the record's back, the cached hash
/// (and every hash carried forward from it) is stale. Nothing detects this.
#[derive(Debug, Clone, Serialize)]
pub struct FileRecord {
    original_filename: String,
    original_path: Option<PathBuf>,
    #[serde(with = "time::serde::rfc3339")]
    import_timestamp: OffsetDateTime,
    mime_type: String,
    file_name: String,
    size: u64,
    path: PathBuf,
    is_onboarded: bool,
    #[serde(skip)]
    content_hash: OnceCell<String>,
}

impl FileRecord {
    /// Read a file's metadata from disk, optionally copying it to `target`.
    ///
    /// Without a target the record references the source in place (its
    /// `path` is the absolute source path). With a target the bytes are copied
    /// there first (parents are created, modification time is preserved) and
    /// the record points at the copy.
    ///
    /// # Errors
    /// Validation errors (see [`ErrorKind::is_validation`]) when `source` is
    /// empty, missing, or not a regular file, or when `target` is empty or
    /// already exists. Nothing is copied in any of those cases.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use onboard_records::FileRecord;
    /// use std::path::Path;
    ///
    /// let record = FileRecord::import_from_path("report.csv", Some(Path::new("/archive/report.csv")), true)?;
    /// assert_eq!(record.path(), Path::new("/archive/report.csv"));
    /// # Ok::<(), onboard_records::error::Error>(())
    /// ```
    pub fn import_from_path(
        source: impl AsRef<Path>,
        target: Option<&Path>,
        include_original_path: bool,
    ) -> Result<Self> {
        import(source.as_ref(), target, include_original_path)
    }

    /// Re-materialize this record's file at `target`.
    ///
    /// The new record keeps this record's identity fields (and the original
    /// path too, if `include_original_path`), and carries the content hash
    /// forward if it has already been computed. See the integrity caveat on
    /// [`FileRecord`].
    #[instrument(skip_all, fields(source = %self.path.display(), target = %target.display()))]
    pub fn copy_to(&self, target: &Path, include_original_path: bool) -> Result<Self> {
        let mut copy = import(&self.path, Some(target), false)?;
        copy.original_filename = self.original_filename.clone();
        copy.original_path = include_original_path.then(|| self.original_path.clone()).flatten();
        copy.import_timestamp = self.import_timestamp;
        copy.file_name = self.file_name.clone();
        if let Some(hash) = self.content_hash.get() {
            copy.content_hash = OnceCell::with_value(hash.clone());
        }
        Ok(copy)
    }

    /// SHA3-256 hex digest of the file content.
    ///
    /// Computed on first access by streaming the file in
    /// [`CHUNK_SIZE`](crate::CHUNK_SIZE) blocks, then cached: later calls do
    /// no I/O. Concurrent first calls run the computation once; the others
    /// wait for it.
    pub fn content_hash(&self) -> Result<&str> {
        self.content_hash
            .get_or_try_init(|| -> Result<String> {
                let file = File::open(&self.path).or_raise(|| ErrorKind::Io(self.path.clone()))?;
                let hash = hash_reader(file).or_raise(|| ErrorKind::Io(self.path.clone()))?;
                tracing::debug!(path = %self.path.display(), hash = %hash, "Computed content hash");
                Ok(hash)
            })
            .map(String::as_str)
    }

    /// Async variant of [`content_hash`](Self::content_hash).
    ///
    /// Concurrent callers may each stream the file, but only the first to
    /// finish stores its digest; the rest return the stored value.
    pub async fn content_hash_async(&self) -> Result<&str> {
        if let Some(hash) = self.content_hash.get() {
            return Ok(hash.as_str());
        }
        let file = tokio::fs::File::open(&self.path).await.or_raise(|| ErrorKind::Io(self.path.clone()))?;
        let hash = hash_async_reader(file).await.or_raise(|| ErrorKind::Io(self.path.clone()))?;
        tracing::debug!(path = %self.path.display(), hash = %hash, "Computed content hash");
        let stored = match self.content_hash.try_insert(hash) {
            Ok(stored) => stored,
            Err((stored, _discarded)) => stored,
        };
        Ok(stored.as_str())
    }

    /// The memoized content hash, if it has been computed.
    pub fn cached_content_hash(&self) -> Option<&str> {
        self.content_hash.get().map(String::as_str)
    }

    /// Flip the record to onboarded after the caller has confirmed that the
    /// bytes now live at `path` inside the archive.
    pub fn mark_onboarded(&mut self, path: impl Into<PathBuf>) {
        self.path = path.into();
        self.is_onboarded = true;
    }

    pub fn original_filename(&self) -> &str {
        &self.original_filename
    }

    pub fn original_path(&self) -> Option<&Path> {
        self.original_path.as_deref()
    }

    pub fn import_timestamp(&self) -> OffsetDateTime {
        self.import_timestamp
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Size in bytes, as read from disk at import.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Current, authoritative location of the file's bytes.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_onboarded(&self) -> bool {
        self.is_onboarded
    }
}

#[instrument(skip_all, fields(source = %source.display(), target = ?target.map(Path::display)))]
fn import(source: &Path, target: Option<&Path>, include_original_path: bool) -> Result<FileRecord> {
    if source.as_os_str().is_empty() {
        exn::bail!(ErrorKind::MissingPath("source"));
    }
    let metadata = match fs::metadata(source) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == IoErrorKind::NotFound => exn::bail!(ErrorKind::NotFound(source.to_path_buf())),
        Err(e) => return Err(e).or_raise(|| ErrorKind::Io(source.to_path_buf())),
    };
    if !metadata.is_file() {
        exn::bail!(ErrorKind::NotAFile(source.to_path_buf()));
    }
    let original_filename = path::file_name(source)?;
    let original_path = path::absolute(source)?;

    let path = match target {
        Some(target) if target.as_os_str().is_empty() => exn::bail!(ErrorKind::MissingPath("target")),
        Some(target) => {
            // Checked up front so that nothing (not even parent directories)
            // is created for a doomed copy. copy_new re-checks atomically.
            if fs::symlink_metadata(target).is_ok() {
                exn::bail!(ErrorKind::AlreadyExists(target.to_path_buf()));
            }
            let target = path::absolute(target)?;
            copy_new(source, &target)?;
            target
        },
        None => original_path.clone(),
    };
    let mime_type = onboard_mime::detect(&path).or_raise(|| ErrorKind::Mime(path.clone()))?;

    tracing::debug!(path = %path.display(), size = metadata.len(), mime_type, "Imported file");
    Ok(FileRecord {
        file_name: original_filename.clone(),
        original_filename,
        original_path: include_original_path.then_some(original_path),
        import_timestamp: OffsetDateTime::now_utc(),
        mime_type: mime_type.to_string(),
        size: metadata.len(),
        path,
        is_onboarded: false,
        content_hash: OnceCell::new(),
    })
}
