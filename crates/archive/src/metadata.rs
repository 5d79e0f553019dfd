//! Flat JSON projections of records, for indexing alongside archived values.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use onboard_records::{FileBundleRecord, FileRecord};
use serde::Serialize;
use serde_json::{Map, Value};

/// A record that can describe itself as a JSON object.
pub trait Metadata: Serialize {
    /// Key the projection is stored under.
    const KEY: &'static str;

    /// The record's public fields as a JSON object. Timestamps are RFC 3339
    /// strings; memoized hashes are not included.
    fn metadata(&self) -> Result<Map<String, Value>> {
        match serde_json::to_value(self).or_raise(|| ErrorKind::Metadata)? {
            Value::Object(map) => Ok(map),
            _ => exn::bail!(ErrorKind::Metadata),
        }
    }
}

impl Metadata for FileRecord {
    const KEY: &'static str = "file";
}

impl Metadata for FileBundleRecord {
    const KEY: &'static str = "file_bundle";
}
