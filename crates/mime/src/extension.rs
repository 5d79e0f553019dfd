use std::path::Path;

/// Resolve a mime type from the file extension.
///
/// The lookup is case-insensitive and only considers the final extension
/// (`archive.tar.gz` resolves as `gz`). Dotfiles such as `.csv` have no
/// extension and therefore resolve to `None`.
#[must_use]
pub fn from_path(path: impl AsRef<Path>) -> Option<&'static str> {
    let extension = path.as_ref().extension()?.to_str()?.to_lowercase();
    let mime = match extension.as_str() {
        // Text
        "txt" | "text" | "log" | "ini" | "cfg" => "text/plain",
        "csv" => "text/csv",
        "tsv" => "text/tab-separated-values",
        "htm" | "html" => "text/html",
        "css" => "text/css",
        "js" | "mjs" => "text/javascript",
        "md" | "markdown" => "text/markdown",
        "xml" => "text/xml",
        "py" => "text/x-python",
        "r" => "text/x-r",
        "sql" => "application/sql",
        "sh" => "application/x-sh",
        "rst" => "text/x-rst",
        "tex" => "application/x-tex",
        "ics" => "text/calendar",
        "vcf" => "text/vcard",
        "srt" => "application/x-subrip",
        "vtt" => "text/vtt",
        // Structured data
        "json" => "application/json",
        "jsonl" | "ndjson" => "application/x-ndjson",
        "geojson" => "application/geo+json",
        "jsonld" => "application/ld+json",
        "ipynb" => "application/x-ipynb+json",
        "yaml" | "yml" => "application/yaml",
        "toml" => "application/toml",
        "parquet" => "application/vnd.apache.parquet",
        "arrow" | "feather" => "application/vnd.apache.arrow.file",
        "sqlite" | "sqlite3" | "db" => "application/vnd.sqlite3",
        "msgpack" => "application/msgpack",
        "avro" => "application/avro",
        "orc" => "application/vnd.apache.orc",
        // Scientific
        "npy" => "application/x-npy",
        "npz" => "application/x-npz",
        "h5" | "hdf5" | "hdf" => "application/x-hdf5",
        "nc" => "application/x-netcdf",
        "mat" => "application/x-matlab-data",
        "fits" | "fit" => "application/fits",
        "pkl" | "pickle" => "application/x-python-pickle",
        "shp" => "application/vnd.shp",
        "kml" => "application/vnd.google-earth.kml+xml",
        "gpx" => "application/gpx+xml",
        // Documents
        "pdf" => "application/pdf",
        "rtf" => "application/rtf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "odt" => "application/vnd.oasis.opendocument.text",
        "ods" => "application/vnd.oasis.opendocument.spreadsheet",
        "odp" => "application/vnd.oasis.opendocument.presentation",
        "epub" => "application/epub+zip",
        // Images
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "tif" | "tiff" => "image/tiff",
        "webp" => "image/webp",
        "ico" => "image/vnd.microsoft.icon",
        "avif" => "image/avif",
        "heic" => "image/heic",
        // Audio & video
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "flac" => "audio/flac",
        "m4a" => "audio/mp4",
        "aac" => "audio/aac",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        // Archives
        "zip" => "application/zip",
        "gz" => "application/gzip",
        "tar" => "application/x-tar",
        "tgz" => "application/gzip",
        "bz2" => "application/x-bzip2",
        "xz" => "application/x-xz",
        "zst" => "application/zstd",
        "7z" => "application/x-7z-compressed",
        // Binaries
        "wasm" => "application/wasm",
        _ => return None,
    };
    Some(mime)
}
