//! Filename derivation for downloaded files

use std::path::{Path, PathBuf};
use url::Url;

/// Characters that are illegal in filenames on at least one common filesystem
const ILLEGAL_FILENAME_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Fallback name for URLs whose path has no final segment
const FALLBACK_FILENAME: &str = "download";

/// Replaces every filesystem-illegal character with `_`
///
/// Sanitizing an already-sanitized name returns it unchanged.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if ILLEGAL_FILENAME_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// Derives a safe local filename from the last segment of a URL path
pub fn filename_from_url(url: &Url) -> String {
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("");

    let sanitized = sanitize_filename(segment);
    if sanitized.is_empty() || sanitized == "." || sanitized == ".." {
        FALLBACK_FILENAME.to_string()
    } else {
        sanitized
    }
}

/// Builds the `n`-th alternative for a taken path: `report.pdf` -> `report_1.pdf`
pub fn numbered_path(path: &Path, n: u32) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| FALLBACK_FILENAME.to_string());

    let name = match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, n, ext.to_string_lossy()),
        None => format!("{}_{}", stem, n),
    };

    path.with_file_name(name)
}
