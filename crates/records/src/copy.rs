use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::fs::{self, File, FileTimes, OpenOptions};
use std::io;
use std::path::Path;

/// Copy `source` to a **new** file at `target`, creating parent directories.
///
/// The target is opened with `create_new`, so an existing file is never
/// truncated even if it appears between the caller's existence check and
/// the copy. Permissions and access/modification times are carried over.
/// A partially written target is removed again if the copy fails.
pub(crate) fn copy_new(source: &Path, target: &Path) -> Result<u64> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).or_raise(|| ErrorKind::Io(parent.to_path_buf()))?;
    }
    let mut reader = File::open(source).or_raise(|| ErrorKind::Io(source.to_path_buf()))?;
    let mut writer = match OpenOptions::new().write(true).create_new(true).open(target) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => exn::bail!(ErrorKind::AlreadyExists(target.to_path_buf())),
        Err(e) => return Err(e).or_raise(|| ErrorKind::Io(target.to_path_buf())),
    };
    let result = copy_contents(&mut reader, &mut writer);
    if result.is_err() {
        drop(writer);
        if let Err(e) = fs::remove_file(target) {
            tracing::warn!(path = %target.display(), error = %e, "Could not remove partially copied file");
        }
    }
    result.or_raise(|| ErrorKind::Io(target.to_path_buf()))
}

/// Remove a directory this call created but could not finish populating,
/// so that the target is free again for a retry.
pub(crate) fn remove_partial_dir(target: &Path) {
    if let Err(e) = fs::remove_dir_all(target) {
        tracing::warn!(path = %target.display(), error = %e, "Could not remove partially copied directory");
    }
}

fn copy_contents(reader: &mut File, writer: &mut File) -> io::Result<u64> {
    let written = io::copy(reader, writer)?;
    let metadata = reader.metadata()?;
    let mut times = FileTimes::new().set_modified(metadata.modified()?);
    if let Ok(accessed) = metadata.accessed() {
        times = times.set_accessed(accessed);
    }
    writer.set_times(times)?;
    writer.set_permissions(metadata.permissions())?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    #[test]
    fn test_copy_creates_parents_and_preserves_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.txt");
        fs::write(&source, b"0123456789").unwrap();
        let modified = SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000);
        File::options().write(true).open(&source).unwrap().set_modified(modified).unwrap();

        let target = dir.path().join("a/b/target.txt");
        assert_eq!(copy_new(&source, &target).unwrap(), 10);
        assert_eq!(fs::read(&target).unwrap(), b"0123456789");
        assert_eq!(fs::metadata(&target).unwrap().modified().unwrap(), modified);
    }

    #[test]
    fn test_copy_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.txt");
        let target = dir.path().join("target.txt");
        fs::write(&source, b"new").unwrap();
        fs::write(&target, b"keep").unwrap();
        let err = copy_new(&source, &target).unwrap_err();
        assert!(matches!(&*err, ErrorKind::AlreadyExists(p) if p == &target));
        assert_eq!(fs::read(&target).unwrap(), b"keep");
    }

    #[test]
    fn test_remove_partial_dir() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("partial");
        fs::create_dir_all(target.join("nested")).unwrap();
        fs::write(target.join("nested/a.txt"), b"a").unwrap();
        remove_partial_dir(&target);
        assert!(!target.exists());
        assert!(dir.path().exists());
    }

    #[test]
    fn test_copy_missing_source_leaves_no_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("target.txt");
        assert!(copy_new(&dir.path().join("missing"), &target).is_err());
        assert!(!target.exists());
    }
}
