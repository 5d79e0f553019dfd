//! Reading bundle members as text.

use crate::bundle::FileBundleRecord;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use futures::{StreamExt, stream};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::instrument;

/// Text of a bundle's members, keyed by relative path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TextContents {
    pub contents: BTreeMap<String, String>,
    /// Members left out because they could not be read as text. Only ever
    /// populated when errors are ignored.
    pub skipped: Vec<SkippedFile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub relative_path: String,
    pub reason: String,
}

async fn read_text(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path).await.or_raise(|| ErrorKind::Io(path.to_path_buf()))?;
    String::from_utf8(bytes).or_raise(|| ErrorKind::InvalidText(path.to_path_buf()))
}

impl FileBundleRecord {
    /// Read every member as UTF-8 text, at most `limit` files at a time.
    ///
    /// With `ignore_errors` a member that cannot be read (or is not valid
    /// UTF-8) is left out and reported in [`TextContents::skipped`];
    /// otherwise the first such member fails the whole read with
    /// [`UnreadableText`](ErrorKind::UnreadableText).
    #[instrument(skip_all, fields(bundle = %self.path().display(), ignore_errors = ignore_errors))]
    pub async fn read_text_file_contents(&self, ignore_errors: bool, limit: usize) -> Result<TextContents> {
        let mut reads = stream::iter(self.included_files())
            .map(|(key, file)| async move { (key, read_text(file.path()).await) })
            .buffer_unordered(limit.max(1));

        let mut text = TextContents::default();
        while let Some((key, result)) = reads.next().await {
            match result {
                Ok(contents) => {
                    text.contents.insert(key.clone(), contents);
                },
                Err(e) if ignore_errors => {
                    let reason = (*e).to_string();
                    tracing::warn!(file = %key, reason = %reason, "Skipping file that cannot be read as text");
                    text.skipped.push(SkippedFile { relative_path: key.clone(), reason });
                },
                Err(e) => return Err(e).or_raise(|| ErrorKind::UnreadableText(key.clone())),
            }
        }
        // Completion order is arbitrary.
        text.skipped.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::ImportFilter;
    use std::fs;

    fn bundle_with_binary(dir: &Path) -> FileBundleRecord {
        let folder = dir.join("source");
        fs::create_dir_all(folder.join("sub")).unwrap();
        fs::write(folder.join("a.txt"), "hello").unwrap();
        fs::write(folder.join("sub/b.md"), "# heading\n").unwrap();
        fs::write(folder.join("c.bin"), [0xff, 0xfe, 0x00, 0x80]).unwrap();
        FileBundleRecord::import_folder(&folder, None, &ImportFilter::none(), true).unwrap()
    }

    #[tokio::test]
    async fn test_read_all_text() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("source");
        fs::create_dir_all(&folder).unwrap();
        fs::write(folder.join("a.txt"), "alpha").unwrap();
        fs::write(folder.join("b.txt"), "bravo").unwrap();
        let bundle = FileBundleRecord::import_folder(&folder, None, &ImportFilter::none(), true).unwrap();

        let text = bundle.read_text_file_contents(false, 2).await.unwrap();
        assert_eq!(text.contents.len(), 2);
        assert_eq!(text.contents["a.txt"], "alpha");
        assert_eq!(text.contents["b.txt"], "bravo");
        assert!(text.skipped.is_empty());
    }

    #[tokio::test]
    async fn test_ignore_errors_skips_binary() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = bundle_with_binary(dir.path());

        let text = bundle.read_text_file_contents(true, 4).await.unwrap();
        assert_eq!(text.contents.keys().map(String::as_str).collect::<Vec<_>>(), ["a.txt", "sub/b.md"]);
        assert_eq!(text.contents["sub/b.md"], "# heading\n");
        assert_eq!(text.skipped.len(), 1);
        assert_eq!(text.skipped[0].relative_path, "c.bin");
    }

    #[tokio::test]
    async fn test_binary_member_fails_read() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = bundle_with_binary(dir.path());

        let err = bundle.read_text_file_contents(false, 4).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::UnreadableText(key) if key == "c.bin"));
    }

    #[tokio::test]
    async fn test_missing_member_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = bundle_with_binary(dir.path());
        fs::remove_file(dir.path().join("source/a.txt")).unwrap();

        let text = bundle.read_text_file_contents(true, 1).await.unwrap();
        let skipped: Vec<_> = text.skipped.iter().map(|s| s.relative_path.as_str()).collect();
        assert_eq!(skipped, ["a.txt", "c.bin"]);
        assert_eq!(text.contents.len(), 1);
    }
}
