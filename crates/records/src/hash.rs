//! SHA3-256 content hashing.
//!
//! File content is streamed through the hasher in [`CHUNK_SIZE`] blocks so
//! that hashing never buffers a whole file in memory.

use sha3::{Digest, Sha3_256};
use std::io::{self, Read};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Block size used when streaming file content through the hasher.
pub const CHUNK_SIZE: usize = 4096;

fn hex_digest(hasher: Sha3_256) -> String {
    format!("{:x}", hasher.finalize())
}

/// Hash everything a reader produces.
pub(crate) fn hash_reader(mut reader: impl Read) -> io::Result<String> {
    let mut hasher = Sha3_256::new();
    let mut buffer = [0u8; CHUNK_SIZE];
    loop {
        match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => hasher.update(&buffer[..read]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(hex_digest(hasher))
}

/// Async counterpart of [`hash_reader`].
pub(crate) async fn hash_async_reader(mut reader: impl AsyncRead + Unpin) -> io::Result<String> {
    let mut hasher = Sha3_256::new();
    let mut buffer = [0u8; CHUNK_SIZE];
    loop {
        match reader.read(&mut buffer).await? {
            0 => break,
            read => hasher.update(&buffer[..read]),
        }
    }
    Ok(hex_digest(hasher))
}

/// Aggregate hash over a bundle's members.
///
/// Members **must** be pushed in ascending key order; the digest covers the
/// concatenation of `"_" + key + "_" + content_hash` for every member.
pub(crate) struct BundleHasher(Sha3_256);
impl BundleHasher {
    pub(crate) fn new() -> Self {
        Self(Sha3_256::new())
    }

    pub(crate) fn push(&mut self, key: &str, content_hash: &str) {
        self.0.update(b"_");
        self.0.update(key.as_bytes());
        self.0.update(b"_");
        self.0.update(content_hash.as_bytes());
    }

    pub(crate) fn finish(self) -> String {
        hex_digest(self.0)
    }
}
