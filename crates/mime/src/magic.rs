/// Number of leading bytes needed to recognise every known signature.
pub const SNIFF_LENGTH: usize = 262;

/// A content signature: every `(offset, bytes)` part must match.
struct Signature {
    parts: &'static [(usize, &'static [u8])],
    mime: &'static str,
}

const SIGNATURES: &[Signature] = &[
    Signature { parts: &[(0, &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A])], mime: "image/png" },
    Signature { parts: &[(0, &[0xFF, 0xD8, 0xFF])], mime: "image/jpeg" },
    Signature { parts: &[(0, b"GIF87a")], mime: "image/gif" },
    Signature { parts: &[(0, b"GIF89a")], mime: "image/gif" },
    Signature { parts: &[(0, b"BM")], mime: "image/bmp" },
    Signature { parts: &[(0, b"II*\0")], mime: "image/tiff" },
    Signature { parts: &[(0, b"MM\0*")], mime: "image/tiff" },
    Signature { parts: &[(0, b"RIFF"), (8, b"WEBP")], mime: "image/webp" },
    Signature { parts: &[(0, b"RIFF"), (8, b"WAVE")], mime: "audio/wav" },
    Signature { parts: &[(0, b"ID3")], mime: "audio/mpeg" },
    Signature { parts: &[(0, b"fLaC")], mime: "audio/flac" },
    Signature { parts: &[(0, b"OggS")], mime: "audio/ogg" },
    Signature { parts: &[(4, b"ftyp")], mime: "video/mp4" },
    Signature { parts: &[(0, &[0x1A, 0x45, 0xDF, 0xA3])], mime: "video/webm" },
    Signature { parts: &[(0, b"%PDF-")], mime: "application/pdf" },
    Signature { parts: &[(0, b"{\\rtf")], mime: "application/rtf" },
    Signature { parts: &[(0, b"PK\x03\x04")], mime: "application/zip" },
    Signature { parts: &[(0, &[0x1F, 0x8B])], mime: "application/gzip" },
    Signature { parts: &[(0, b"BZh")], mime: "application/x-bzip2" },
    Signature { parts: &[(0, &[0xFD, b'7', b'z', b'X', b'Z', 0x00])], mime: "application/x-xz" },
    Signature { parts: &[(0, &[0x28, 0xB5, 0x2F, 0xFD])], mime: "application/zstd" },
    Signature { parts: &[(0, &[b'7', b'z', 0xBC, 0xAF, 0x27, 0x1C])], mime: "application/x-7z-compressed" },
    Signature { parts: &[(257, b"ustar")], mime: "application/x-tar" },
    Signature { parts: &[(0, b"PAR1")], mime: "application/vnd.apache.parquet" },
    Signature { parts: &[(0, b"ARROW1")], mime: "application/vnd.apache.arrow.file" },
    Signature { parts: &[(0, b"SQLite format 3\0")], mime: "application/vnd.sqlite3" },
    Signature { parts: &[(0, b"\x93NUMPY")], mime: "application/x-npy" },
    Signature { parts: &[(0, b"\x89HDF\r\n\x1a\n")], mime: "application/x-hdf5" },
    Signature { parts: &[(0, b"CDF\x01")], mime: "application/x-netcdf" },
    Signature { parts: &[(0, b"CDF\x02")], mime: "application/x-netcdf" },
    Signature { parts: &[(0, b"SIMPLE  =")], mime: "application/fits" },
    Signature { parts: &[(0, b"\0asm")], mime: "application/wasm" },
    Signature { parts: &[(0, &[0x7F, b'E', b'L', b'F'])], mime: "application/x-executable" },
];

impl Signature {
    fn matches(&self, bytes: &[u8]) -> bool {
        self.parts
            .iter()
            .all(|(offset, magic)| bytes.get(*offset..*offset + magic.len()).is_some_and(|window| window == *magic))
    }
}

/// Detect a mime type from the leading bytes of a file.
///
/// Returns `None` if no signature matches or if the input is too short to
/// contain any signature.
#[must_use]
pub fn from_magic_bytes(bytes: &[u8]) -> Option<&'static str> {
    SIGNATURES.iter().find(|signature| signature.matches(bytes)).map(|signature| signature.mime)
}
