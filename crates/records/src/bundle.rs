//! Folder snapshot records.

use crate::copy::remove_partial_dir;
use crate::error::{ErrorKind, Result};
use crate::file::FileRecord;
use crate::filter::ImportFilter;
use crate::hash::BundleHasher;
use crate::path;
use exn::{OptionExt, ResultExt};
use futures::{StreamExt, TryStreamExt, stream};
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tracing::instrument;
use walkdir::WalkDir;

/// An immutable snapshot of a directory tree.
///
/// Members are keyed by their POSIX-style path relative to the bundle root.
/// The map is ordered, which is what makes the [bundle hash](Self::bundle_hash)
/// independent of the order in which the directory was walked.
#[derive(Debug, Clone, Serialize)]
pub struct FileBundleRecord {
    original_bundle_name: String,
    bundle_name: String,
    original_path: Option<PathBuf>,
    path: PathBuf,
    #[serde(with = "time::serde::rfc3339")]
    import_timestamp: OffsetDateTime,
    file_count: usize,
    included_files: BTreeMap<String, FileRecord>,
    total_size: u64,
    is_onboarded: bool,
    #[serde(skip)]
    bundle_hash: OnceCell<String>,
}

impl FileBundleRecord {
    /// Snapshot the folder at `source`, optionally copying it to `target`.
    ///
    /// The tree is walked top-down; directories named in
    /// [`exclude_dir_names`](ImportFilter::exclude_dir_names) are pruned before
    /// they are entered, so nothing below them is ever read. Every remaining
    /// regular file that passes the filter becomes a [`FileRecord`], copied to
    /// `target/<relative path>` when a target is given.
    ///
    /// # Errors
    /// Validation errors when `source` is empty, missing or not a directory,
    /// or when `target` already exists or lies inside `source`. Any failure
    /// importing an individual file aborts the whole import.
    pub fn import_folder(
        source: impl AsRef<Path>,
        target: Option<&Path>,
        filter: &ImportFilter,
        include_original_path: bool,
    ) -> Result<Self> {
        import_folder(source.as_ref(), target, filter, include_original_path)
    }

    /// Build a bundle directly from already-imported file records.
    ///
    /// `bundle_name` is taken from the last component of `path`, the import
    /// time is now, and `total_size` is summed from the files unless given.
    pub fn create_from_file_models(
        files: impl IntoIterator<Item = (String, FileRecord)>,
        original_bundle_name: impl Into<String>,
        original_path: Option<PathBuf>,
        path: impl Into<PathBuf>,
        total_size: Option<u64>,
    ) -> Self {
        let included_files: BTreeMap<String, FileRecord> = files.into_iter().collect();
        let path = path.into();
        let total_size = total_size.unwrap_or_else(|| included_files.values().map(FileRecord::size).sum());
        Self {
            original_bundle_name: original_bundle_name.into(),
            bundle_name: path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default(),
            original_path,
            path,
            import_timestamp: OffsetDateTime::now_utc(),
            file_count: included_files.len(),
            included_files,
            total_size,
            is_onboarded: false,
            bundle_hash: OnceCell::new(),
        }
    }

    /// Copy every member to `target/<relative path>` and describe the result.
    ///
    /// The copy keeps the original bundle name, import time and (if
    /// `include_original_path`) original path, passes `total_size` through
    /// unchanged, and carries already computed file and bundle hashes
    /// forward.
    ///
    /// # Errors
    /// [`SameTarget`](ErrorKind::SameTarget) if `target` is this bundle's own
    /// path, [`AlreadyExists`](ErrorKind::AlreadyExists) if it exists. Both
    /// are raised before any file is touched. If copying a member fails, the
    /// target directory is removed again.
    #[instrument(skip_all, fields(source = %self.path.display(), target = %target.display()))]
    pub fn copy_to(&self, target: &Path, include_original_path: bool) -> Result<Self> {
        if target.as_os_str().is_empty() {
            exn::bail!(ErrorKind::MissingPath("target"));
        }
        let target = path::absolute(target)?;
        if target == self.path {
            exn::bail!(ErrorKind::SameTarget(target));
        }
        if fs::symlink_metadata(&target).is_ok() {
            exn::bail!(ErrorKind::AlreadyExists(target));
        }
        fs::create_dir_all(&target).or_raise(|| ErrorKind::Io(target.clone()))?;

        let files = self
            .included_files
            .iter()
            .map(|(key, file)| Ok((key.clone(), file.copy_to(&target.join(key), include_original_path)?)))
            .collect::<Result<BTreeMap<_, _>>>()
            .inspect_err(|_| remove_partial_dir(&target))?;
        let mut copy = Self::create_from_file_models(
            files,
            self.original_bundle_name.clone(),
            include_original_path.then(|| self.original_path.clone()).flatten(),
            target,
            Some(self.total_size),
        );
        copy.import_timestamp = self.import_timestamp;
        if let Some(hash) = self.bundle_hash.get() {
            copy.bundle_hash = OnceCell::with_value(hash.clone());
        }
        tracing::debug!(path = %copy.path.display(), files = copy.file_count, "Copied bundle");
        Ok(copy)
    }

    /// Deterministic aggregate hash over all members.
    ///
    /// SHA3-256 over `"_" + relative_path + "_" + content_hash` for every
    /// member in ascending key order. Computing it forces every member's
    /// content hash. Cached after the first successful call.
    pub fn bundle_hash(&self) -> Result<&str> {
        self.bundle_hash
            .get_or_try_init(|| -> Result<String> {
                let mut hasher = BundleHasher::new();
                for (key, file) in &self.included_files {
                    hasher.push(key, file.content_hash()?);
                }
                Ok(hasher.finish())
            })
            .map(String::as_str)
    }

    /// [`bundle_hash`](Self::bundle_hash), with member content hashes
    /// computed concurrently (at most `limit` files at a time).
    pub async fn bundle_hash_concurrent(&self, limit: usize) -> Result<&str> {
        if self.bundle_hash.get().is_none() {
            stream::iter(self.included_files.values())
                .map(Ok)
                .try_for_each_concurrent(limit.max(1), |file| async move { file.content_hash_async().await.map(|_| ()) })
                .await?;
        }
        self.bundle_hash()
    }

    /// The memoized bundle hash, if it has been computed.
    pub fn cached_bundle_hash(&self) -> Option<&str> {
        self.bundle_hash.get().map(String::as_str)
    }

    /// POSIX-style path of `file` relative to this bundle's root.
    pub fn relative_path_of(&self, file: &FileRecord) -> Result<String> {
        let relative = file
            .path()
            .strip_prefix(&self.path)
            .or_raise(|| ErrorKind::InvalidPath(file.path().to_path_buf()))?;
        path::relative_key(relative)
    }

    /// Flip the bundle and every member to onboarded, replacing the members
    /// with the archive-owned `files` that now live under `path`.
    pub fn mark_onboarded(&mut self, path: impl Into<PathBuf>, files: BTreeMap<String, FileRecord>) {
        self.path = path.into();
        self.file_count = files.len();
        self.included_files = files;
        for file in self.included_files.values_mut() {
            let location = file.path().to_path_buf();
            file.mark_onboarded(location);
        }
        self.is_onboarded = true;
    }

    pub fn original_bundle_name(&self) -> &str {
        &self.original_bundle_name
    }

    pub fn bundle_name(&self) -> &str {
        &self.bundle_name
    }

    pub fn original_path(&self) -> Option<&Path> {
        self.original_path.as_deref()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn import_timestamp(&self) -> OffsetDateTime {
        self.import_timestamp
    }

    pub fn file_count(&self) -> usize {
        self.file_count
    }

    pub fn included_files(&self) -> &BTreeMap<String, FileRecord> {
        &self.included_files
    }

    /// Combined size of all members, as recorded when the bundle was built.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn is_onboarded(&self) -> bool {
        self.is_onboarded
    }

    /// Consume the bundle, yielding its members.
    pub fn into_included_files(self) -> BTreeMap<String, FileRecord> {
        self.included_files
    }
}

#[instrument(skip_all, fields(source = %source.display(), target = ?target.map(Path::display)))]
fn import_folder(
    source: &Path,
    target: Option<&Path>,
    filter: &ImportFilter,
    include_original_path: bool,
) -> Result<FileBundleRecord> {
    if source.as_os_str().is_empty() {
        exn::bail!(ErrorKind::MissingPath("source"));
    }
    let metadata = match fs::metadata(source) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == IoErrorKind::NotFound => exn::bail!(ErrorKind::NotFound(source.to_path_buf())),
        Err(e) => return Err(e).or_raise(|| ErrorKind::Io(source.to_path_buf())),
    };
    if !metadata.is_dir() {
        exn::bail!(ErrorKind::NotADirectory(source.to_path_buf()));
    }
    let source = path::absolute(source)?;
    let target = match target {
        Some(target) if target.as_os_str().is_empty() => exn::bail!(ErrorKind::MissingPath("target")),
        Some(target) => {
            if fs::symlink_metadata(target).is_ok() {
                exn::bail!(ErrorKind::AlreadyExists(target.to_path_buf()));
            }
            let target = path::absolute(target)?;
            if target.starts_with(&source) {
                exn::bail!(ErrorKind::TargetInsideSource(target));
            }
            fs::create_dir_all(&target).or_raise(|| ErrorKind::Io(target.clone()))?;
            Some(target)
        },
        None => None,
    };
    let original_bundle_name = path::file_name(&source)?;

    let walked = walk(&source, target.as_deref(), filter, include_original_path);
    let (files, total_size) = match (walked, &target) {
        (Err(e), Some(target)) => {
            remove_partial_dir(target);
            return Err(e);
        },
        (walked, _) => walked?,
    };

    tracing::debug!(source = %source.display(), files = files.len(), total_size, "Imported folder");
    let path = target.unwrap_or_else(|| source.clone());
    Ok(FileBundleRecord::create_from_file_models(
        files,
        original_bundle_name,
        include_original_path.then_some(source),
        path,
        Some(total_size),
    ))
}

/// Walk `source` top-down, importing every file that passes `filter` (and
/// copying it below `target`, if given).
fn walk(
    source: &Path,
    target: Option<&Path>,
    filter: &ImportFilter,
    include_original_path: bool,
) -> Result<(BTreeMap<String, FileRecord>, u64)> {
    let mut files = BTreeMap::new();
    let mut total_size = 0;
    let walker = WalkDir::new(source).min_depth(1).into_iter().filter_entry(|entry| {
        // Pruning here (rather than filtering the results) stops the walk
        // from ever entering excluded directories.
        !(entry.file_type().is_dir() && entry.file_name().to_str().is_some_and(|name| filter.prunes_dir(name)))
    });
    for entry in walker {
        let entry = entry.or_raise(|| ErrorKind::Io(source.to_path_buf()))?;
        if entry.file_type().is_dir() {
            continue;
        }
        let name = entry.file_name().to_str().ok_or_raise(|| ErrorKind::InvalidPath(entry.path().to_path_buf()))?;
        // Symlinks are followed here, so a link to a regular file counts.
        if !filter.includes_file(name) || !entry.path().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(source).or_raise(|| ErrorKind::InvalidPath(entry.path().to_path_buf()))?;
        let key = path::relative_key(relative)?;
        let file_target = target.map(|target| target.join(relative));
        let file = FileRecord::import_from_path(entry.path(), file_target.as_deref(), include_original_path)?;
        total_size += file.size();
        files.insert(key, file);
    }
    Ok((files, total_size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::hash_reader;

    fn write(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn keys(bundle: &FileBundleRecord) -> Vec<&str> {
        bundle.included_files().keys().map(String::as_str).collect()
    }

    fn sample_folder(root: &Path) -> PathBuf {
        let folder = root.join("source");
        write(&folder, "a.txt", b"alpha");
        write(&folder, "b.txt", b"bravo!");
        write(&folder, ".git/x", b"git object");
        folder
    }

    #[test]
    fn test_import_folder_prunes_excluded_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let folder = sample_folder(dir.path());
        let filter = ImportFilter::default().with_exclude_dir_names([".git"]);
        let bundle = FileBundleRecord::import_folder(&folder, None, &filter, true).unwrap();
        assert_eq!(keys(&bundle), ["a.txt", "b.txt"]);
        assert_eq!(bundle.file_count(), 2);
        assert_eq!(bundle.total_size(), 11);
        assert_eq!(bundle.bundle_name(), "source");
        assert_eq!(bundle.original_bundle_name(), "source");
        assert_eq!(bundle.path(), folder);
        assert_eq!(bundle.original_path(), Some(folder.as_path()));
        assert!(!bundle.is_onboarded());
    }

    #[test]
    fn test_import_folder_without_pruning_keeps_nested_keys() {
        let dir = tempfile::tempdir().unwrap();
        let folder = sample_folder(dir.path());
        write(&folder, "deep/er/c.csv", b"c");
        let bundle = FileBundleRecord::import_folder(&folder, None, &ImportFilter::none(), false).unwrap();
        assert_eq!(keys(&bundle), [".git/x", "a.txt", "b.txt", "deep/er/c.csv"]);
        assert_eq!(bundle.file_count(), bundle.included_files().len());
        assert_eq!(bundle.original_path(), None);
    }

    #[test]
    fn test_import_folder_applies_file_filter() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("source");
        write(&folder, "keep.txt", b"1");
        write(&folder, "skip.csv", b"2");
        write(&folder, "both.tmp.txt", b"3");
        write(&folder, "sub/.DS_Store", b"4");
        let filter = ImportFilter::default()
            .with_include_suffixes([".txt"])
            .with_exclude_file_suffixes([".tmp.txt", ".DS_Store"]);
        let bundle = FileBundleRecord::import_folder(&folder, None, &filter, true).unwrap();
        assert_eq!(keys(&bundle), ["keep.txt"]);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_pruned_dirs_are_never_visited() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        let folder = sample_folder(dir.path());
        // A non UTF-8 name fails the import if the walk ever reaches it.
        let poison = folder.join(".git").join(OsStr::from_bytes(b"\xff.txt"));
        fs::write(&poison, b"poison").unwrap();

        let unpruned = ImportFilter::default().with_include_suffixes([".txt"]);
        let err = FileBundleRecord::import_folder(&folder, None, &unpruned, true).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));

        let pruned = unpruned.with_exclude_dir_names([".git"]);
        let bundle = FileBundleRecord::import_folder(&folder, None, &pruned, true).unwrap();
        assert_eq!(keys(&bundle), ["a.txt", "b.txt"]);
    }

    #[test]
    fn test_import_folder_to_target() {
        let dir = tempfile::tempdir().unwrap();
        let folder = sample_folder(dir.path());
        let target = dir.path().join("archive/copy/");
        let filter = ImportFilter::default().with_exclude_dir_names([".git"]);
        let bundle = FileBundleRecord::import_folder(format!("{}/", folder.display()), Some(&target), &filter, true)
            .unwrap();
        let target = dir.path().join("archive/copy");
        assert_eq!(bundle.path(), target);
        assert_eq!(bundle.bundle_name(), "copy");
        assert_eq!(bundle.original_bundle_name(), "source");
        assert_eq!(fs::read(target.join("a.txt")).unwrap(), b"alpha");
        assert_eq!(bundle.included_files()["b.txt"].path(), target.join("b.txt"));
        assert!(!target.join(".git").exists());
        assert_eq!(bundle.relative_path_of(&bundle.included_files()["b.txt"]).unwrap(), "b.txt");

        // The target is now occupied.
        let err = FileBundleRecord::import_folder(&folder, Some(&target), &filter, true).unwrap_err();
        assert!(matches!(&*err, ErrorKind::AlreadyExists(_)));
    }

    #[test]
    fn test_import_folder_creates_empty_target() {
        let dir = tempfile::tempdir().unwrap();
        let folder = sample_folder(dir.path());
        let target = dir.path().join("empty");
        let filter = ImportFilter::none().with_include_suffixes([".parquet"]);
        let bundle = FileBundleRecord::import_folder(&folder, Some(&target), &filter, true).unwrap();
        assert!(target.is_dir());
        assert_eq!(bundle.file_count(), 0);
        assert_eq!(bundle.total_size(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks() {
        use std::os::unix::fs::symlink;

        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("source");
        let outside = dir.path().join("outside");
        write(&outside, "linked.txt", b"linked");
        write(&folder, "a.txt", b"alpha");
        symlink(outside.join("linked.txt"), folder.join("file-link.txt")).unwrap();
        symlink(&outside, folder.join("dir-link")).unwrap();

        let bundle = FileBundleRecord::import_folder(&folder, None, &ImportFilter::none(), true).unwrap();
        assert_eq!(keys(&bundle), ["a.txt", "file-link.txt"]);
        assert_eq!(bundle.included_files()["file-link.txt"].size(), 6);
    }

    #[test]
    fn test_import_folder_validation() {
        let dir = tempfile::tempdir().unwrap();
        let folder = sample_folder(dir.path());
        let filter = ImportFilter::default();

        let err = FileBundleRecord::import_folder("", None, &filter, true).unwrap_err();
        assert!(matches!(&*err, ErrorKind::MissingPath("source")));
        let err = FileBundleRecord::import_folder(dir.path().join("missing"), None, &filter, true).unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
        let err = FileBundleRecord::import_folder(folder.join("a.txt"), None, &filter, true).unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotADirectory(_)));
        let err = FileBundleRecord::import_folder(&folder, Some(&folder.join("inner")), &filter, true).unwrap_err();
        assert!(matches!(&*err, ErrorKind::TargetInsideSource(_)));
        assert!(err.is_validation());
        assert!(!folder.join("inner").exists());
    }

    #[test]
    fn test_create_from_file_models_sums_sizes() {
        let dir = tempfile::tempdir().unwrap();
        let a = FileRecord::import_from_path(write(dir.path(), "a.txt", b"12345"), None, true).unwrap();
        let b = FileRecord::import_from_path(write(dir.path(), "b.txt", b"123"), None, true).unwrap();
        let bundle = FileBundleRecord::create_from_file_models(
            [("a.txt".to_string(), a.clone()), ("b.txt".to_string(), b.clone())],
            "original",
            None,
            dir.path().join("bundle"),
            None,
        );
        assert_eq!(bundle.total_size(), 8);
        assert_eq!(bundle.file_count(), 2);
        assert_eq!(bundle.bundle_name(), "bundle");
        assert_eq!(bundle.original_bundle_name(), "original");

        let supplied = FileBundleRecord::create_from_file_models(
            [("a.txt".to_string(), a), ("b.txt".to_string(), b)],
            "original",
            None,
            dir.path().join("bundle"),
            Some(42),
        );
        assert_eq!(supplied.total_size(), 42);
    }

    #[test]
    fn test_bundle_hash_value() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("source");
        write(&folder, "b.txt", b"");
        write(&folder, "a.txt", b"abc");
        let bundle = FileBundleRecord::import_folder(&folder, None, &ImportFilter::none(), true).unwrap();
        let abc = hash_reader(&b"abc"[..]).unwrap();
        let empty = hash_reader(&b""[..]).unwrap();
        let expected = hash_reader(format!("_a.txt_{abc}_b.txt_{empty}").as_bytes()).unwrap();
        assert_eq!(bundle.bundle_hash().unwrap(), expected);
    }

    #[test]
    fn test_bundle_hash_independent_of_creation_order() {
        let dir = tempfile::tempdir().unwrap();
        let contents: [(&str, &[u8]); 4] =
            [("z.txt", b"zulu"), ("a.txt", b"alpha"), ("m/n.txt", b"november"), ("m.txt", b"mike")];
        let first = dir.path().join("first");
        for (name, content) in contents {
            write(&first, name, content);
        }
        let second = dir.path().join("second");
        for (name, content) in contents.iter().rev() {
            write(&second, name, content);
        }
        let filter = ImportFilter::none();
        let first = FileBundleRecord::import_folder(&first, None, &filter, true).unwrap();
        let second = FileBundleRecord::import_folder(&second, None, &filter, true).unwrap();
        assert_eq!(first.bundle_hash().unwrap(), second.bundle_hash().unwrap());

        // Same pairs, inserted in opposite orders.
        let forward = first.included_files().iter().map(|(k, v)| (k.clone(), v.clone()));
        let backward = first.included_files().iter().rev().map(|(k, v)| (k.clone(), v.clone()));
        let forward = FileBundleRecord::create_from_file_models(forward, "x", None, dir.path(), None);
        let backward = FileBundleRecord::create_from_file_models(backward, "x", None, dir.path(), None);
        assert_eq!(forward.bundle_hash().unwrap(), backward.bundle_hash().unwrap());
    }

    #[test]
    fn test_bundle_hash_is_memoized() {
        let dir = tempfile::tempdir().unwrap();
        let folder = sample_folder(dir.path());
        let bundle = FileBundleRecord::import_folder(&folder, None, &ImportFilter::none(), true).unwrap();
        let hash = bundle.bundle_hash().unwrap().to_string();
        fs::remove_dir_all(&folder).unwrap();
        assert_eq!(bundle.bundle_hash().unwrap(), hash);
        assert_eq!(bundle.cached_bundle_hash(), Some(hash.as_str()));
    }

    #[test]
    fn test_copy_carries_hashes_without_recomputation() {
        let dir = tempfile::tempdir().unwrap();
        let folder = sample_folder(dir.path());
        let filter = ImportFilter::default().with_exclude_dir_names([".git"]);
        let bundle = FileBundleRecord::import_folder(&folder, None, &filter, true).unwrap();
        let hash = bundle.bundle_hash().unwrap().to_string();

        let target = dir.path().join("copy");
        let copy = bundle.copy_to(&target, true).unwrap();
        assert_eq!(copy.cached_bundle_hash(), Some(hash.as_str()));
        for (key, file) in copy.included_files() {
            assert_eq!(file.cached_content_hash(), bundle.included_files()[key].cached_content_hash());
            assert!(file.cached_content_hash().is_some());
        }
        // Removing the copied bytes proves nothing is re-read.
        fs::remove_dir_all(&target).unwrap();
        assert_eq!(copy.bundle_hash().unwrap(), hash);
    }

    #[test]
    fn test_copy_preserves_identity() {
        let dir = tempfile::tempdir().unwrap();
        let folder = sample_folder(dir.path());
        let bundle = FileBundleRecord::import_folder(&folder, None, &ImportFilter::none(), true).unwrap();
        let target = dir.path().join("elsewhere");
        let copy = bundle.copy_to(&target, true).unwrap();
        assert_eq!(copy.path(), target);
        assert_eq!(copy.bundle_name(), "elsewhere");
        assert_eq!(copy.original_bundle_name(), bundle.original_bundle_name());
        assert_eq!(copy.original_path(), bundle.original_path());
        assert_eq!(copy.import_timestamp(), bundle.import_timestamp());
        assert_eq!(copy.total_size(), bundle.total_size());
        assert_eq!(keys(&copy), keys(&bundle));
        assert_eq!(fs::read(target.join(".git/x")).unwrap(), b"git object");
        assert!(copy.cached_bundle_hash().is_none());
        assert_eq!(copy.bundle_hash().unwrap(), bundle.bundle_hash().unwrap());

        let anonymous = bundle.copy_to(&dir.path().join("anonymous"), false).unwrap();
        assert_eq!(anonymous.original_path(), None);
    }

    #[test]
    fn test_copy_guards() {
        let dir = tempfile::tempdir().unwrap();
        let folder = sample_folder(dir.path());
        let bundle = FileBundleRecord::import_folder(&folder, None, &ImportFilter::none(), true).unwrap();

        let err = bundle.copy_to(&folder, true).unwrap_err();
        assert!(matches!(&*err, ErrorKind::SameTarget(_)));

        let occupied = dir.path().join("occupied");
        write(&occupied, "mine.txt", b"mine");
        let err = bundle.copy_to(&occupied, true).unwrap_err();
        assert!(matches!(&*err, ErrorKind::AlreadyExists(_)));
        assert_eq!(fs::read(occupied.join("mine.txt")).unwrap(), b"mine");
        assert!(!occupied.join("a.txt").exists());
    }

    #[test]
    fn test_failed_copy_frees_target_for_retry() {
        let dir = tempfile::tempdir().unwrap();
        let folder = sample_folder(dir.path());
        let bundle = FileBundleRecord::import_folder(&folder, None, &ImportFilter::none(), true).unwrap();
        let target = dir.path().join("copy");

        fs::rename(folder.join("b.txt"), dir.path().join("b.txt")).unwrap();
        let err = bundle.copy_to(&target, true).unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
        assert!(!target.exists());

        fs::rename(dir.path().join("b.txt"), folder.join("b.txt")).unwrap();
        let copy = bundle.copy_to(&target, true).unwrap();
        assert_eq!(keys(&copy), keys(&bundle));
        assert_eq!(fs::read(target.join("b.txt")).unwrap(), b"bravo!");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_failed_import_removes_target() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        let folder = sample_folder(dir.path());
        fs::write(folder.join(OsStr::from_bytes(b"\xff.txt")), b"bad name").unwrap();
        let target = dir.path().join("copy");

        let err = FileBundleRecord::import_folder(&folder, Some(&target), &ImportFilter::none(), true).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn test_concurrent_bundle_hash_matches_sequential() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("source");
        for i in 0..20 {
            write(&folder, &format!("dir{}/file{i}.bin", i % 3), &vec![i as u8; 5000 + i]);
        }
        let filter = ImportFilter::none();
        let sequential = FileBundleRecord::import_folder(&folder, None, &filter, true).unwrap();
        let concurrent = FileBundleRecord::import_folder(&folder, None, &filter, true).unwrap();
        let expected = sequential.bundle_hash().unwrap();
        assert_eq!(concurrent.bundle_hash_concurrent(4).await.unwrap(), expected);
        assert!(concurrent.included_files().values().all(|f| f.cached_content_hash().is_some()));
    }

    #[test]
    fn test_mark_onboarded() {
        let dir = tempfile::tempdir().unwrap();
        let folder = sample_folder(dir.path());
        let mut bundle = FileBundleRecord::import_folder(&folder, None, &ImportFilter::none(), true).unwrap();
        let target = dir.path().join("archive");
        let copy = bundle.copy_to(&target, true).unwrap();
        let path = copy.path().to_path_buf();
        bundle.mark_onboarded(path, copy.into_included_files());
        assert!(bundle.is_onboarded());
        assert_eq!(bundle.path(), target);
        assert!(bundle.included_files().values().all(|f| f.is_onboarded() && f.path().starts_with(&target)));
    }
}
