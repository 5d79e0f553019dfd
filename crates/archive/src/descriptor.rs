//! Load descriptors: how to rebuild an onboarded value from the archive.
//!
//! On the wire a descriptor is a small JSON document naming the loader
//! (`module_type`), its arguments (`inputs`) and what it produces
//! (`output_name`):
//!
//! ```json
//! {
//!   "module_type": "file.load",
//!   "inputs": { "base_path": "/archive/value-id", "rel_path": "report.csv" },
//!   "output_name": "file"
//! }
//! ```

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use onboard_records::{FileBundleRecord, FileRecord, ImportFilter, relative_location};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::path::{Path, PathBuf};
use tracing::instrument;

const FILE_LOADER: &str = "file.load";
const FILE_BUNDLE_LOADER: &str = "file_bundle.load";

/// Where an onboarded value lives in the archive, and how to load it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "WireDescriptor")]
pub enum LoadDescriptor {
    File { base_path: PathBuf, rel_path: String },
    FileBundle { base_path: PathBuf, rel_path: String, filter: ImportFilter },
}

/// A value rebuilt from the archive.
#[derive(Debug, Clone)]
pub enum Loaded {
    File(FileRecord),
    FileBundle(FileBundleRecord),
}

impl LoadDescriptor {
    pub fn module_type(&self) -> &'static str {
        match self {
            Self::File { .. } => FILE_LOADER,
            Self::FileBundle { .. } => FILE_BUNDLE_LOADER,
        }
    }

    pub fn output_name(&self) -> &'static str {
        match self {
            Self::File { .. } => "file",
            Self::FileBundle { .. } => "file_bundle",
        }
    }

    /// Absolute location of the described value.
    pub fn location(&self) -> Result<PathBuf> {
        match self {
            Self::File { base_path, rel_path } | Self::FileBundle { base_path, rel_path, .. } => {
                resolve(base_path, rel_path)
            },
        }
    }

    /// Rebuild the described record from disk.
    pub fn load(&self) -> Result<Loaded> {
        match self {
            Self::File { base_path, rel_path } => load_file(base_path, rel_path).map(Loaded::File),
            Self::FileBundle { base_path, rel_path, filter } => {
                load_bundle(base_path, rel_path, filter).map(Loaded::FileBundle)
            },
        }
    }
}

/// Rebuild a file record from `base_path/rel_path`.
///
/// The record is archive-owned, so it comes back already onboarded.
#[instrument(skip_all, fields(base = %base_path.as_ref().display(), rel = rel_path))]
pub fn load_file(base_path: impl AsRef<Path>, rel_path: &str) -> Result<FileRecord> {
    let location = resolve(base_path.as_ref(), rel_path)?;
    let mut file = FileRecord::import_from_path(&location, None, true).or_raise(|| ErrorKind::Load(location.clone()))?;
    let path = file.path().to_path_buf();
    file.mark_onboarded(path);
    Ok(file)
}

/// Rebuild a bundle record from the folder at `base_path/rel_path`.
#[instrument(skip_all, fields(base = %base_path.as_ref().display(), rel = rel_path))]
pub fn load_bundle(base_path: impl AsRef<Path>, rel_path: &str, filter: &ImportFilter) -> Result<FileBundleRecord> {
    let location = resolve(base_path.as_ref(), rel_path)?;
    let mut bundle = FileBundleRecord::import_folder(&location, None, filter, true)
        .or_raise(|| ErrorKind::Load(location.clone()))?;
    let path = bundle.path().to_path_buf();
    let files = bundle.included_files().clone();
    bundle.mark_onboarded(path, files);
    Ok(bundle)
}

fn resolve(base_path: &Path, rel_path: &str) -> Result<PathBuf> {
    let relative = relative_location(rel_path).or_raise(|| ErrorKind::InvalidPath(rel_path.to_string()))?;
    Ok(base_path.join(relative))
}

#[derive(Deserialize)]
struct WireDescriptor {
    module_type: String,
    inputs: serde_json::Value,
    output_name: String,
}

#[derive(Serialize, Deserialize)]
struct FileInputs {
    base_path: PathBuf,
    rel_path: String,
}

#[derive(Serialize, Deserialize)]
struct FileBundleInputs {
    base_path: PathBuf,
    rel_path: String,
    #[serde(flatten)]
    filter: ImportFilter,
}

impl TryFrom<WireDescriptor> for LoadDescriptor {
    type Error = String;

    fn try_from(wire: WireDescriptor) -> std::result::Result<Self, Self::Error> {
        let descriptor = match wire.module_type.as_str() {
            FILE_LOADER => {
                let FileInputs { base_path, rel_path } = serde_json::from_value(wire.inputs).map_err(|e| e.to_string())?;
                Self::File { base_path, rel_path }
            },
            FILE_BUNDLE_LOADER => {
                let FileBundleInputs { base_path, rel_path, filter } =
                    serde_json::from_value(wire.inputs).map_err(|e| e.to_string())?;
                Self::FileBundle { base_path, rel_path, filter }
            },
            other => return Err(format!("unknown module type `{other}`")),
        };
        if wire.output_name != descriptor.output_name() {
            return Err(format!("`{}` does not produce `{}`", wire.module_type, wire.output_name));
        }
        Ok(descriptor)
    }
}

impl Serialize for LoadDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("LoadDescriptor", 3)?;
        state.serialize_field("module_type", self.module_type())?;
        match self {
            Self::File { base_path, rel_path } => state.serialize_field(
                "inputs",
                &FileInputs { base_path: base_path.clone(), rel_path: rel_path.clone() },
            )?,
            Self::FileBundle { base_path, rel_path, filter } => state.serialize_field(
                "inputs",
                &FileBundleInputs { base_path: base_path.clone(), rel_path: rel_path.clone(), filter: filter.clone() },
            )?,
        }
        state.serialize_field("output_name", self.output_name())?;
        state.end()
    }
}
