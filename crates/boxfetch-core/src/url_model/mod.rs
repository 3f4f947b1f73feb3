//! Output filename derivation.
//!
//! A finished transfer is named from, in order: the Content-Disposition filename,
//! the URL's last path segment (when it has an extension), the Content-Type mapped
//! onto the submitted file's stem, and finally the submitted name itself. Every
//! candidate goes through `sanitize_filename`.

mod content_disposition;
mod path;
mod percent;
mod sanitize;

pub use content_disposition::parse_content_disposition_filename;
pub use path::filename_from_url_path;
pub use sanitize::{safe_upload_name, sanitize_filename, truncate_name, NAME_MAX};

use crate::job_store::JobId;
use crate::transfer::PART_SUFFIX;

/// Fallback when no candidate yields a usable name.
pub const DEFAULT_FILENAME: &str = "download.bin";

/// Response metadata that can name the artifact.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameHints<'a> {
    pub content_disposition: Option<&'a str>,
    pub content_type: Option<&'a str>,
}

/// File extension (with dot) for media and archive content types the provider serves.
pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    let mime = content_type.split(';').next()?.trim().to_ascii_lowercase();
    let ext = match mime.as_str() {
        "video/mp4" => ".mp4",
        "video/x-matroska" => ".mkv",
        "video/x-msvideo" => ".avi",
        "application/x-bittorrent" => ".torrent",
        "application/x-nzb" => ".nzb",
        "application/zip" | "application/x-zip-compressed" => ".zip",
        _ => return None,
    };
    Some(ext)
}

/// `name` without its final extension.
pub fn file_stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(0) | None => name,
        Some(i) => &name[..i],
    }
}

/// Chooses the artifact name for a download of `url` submitted as `original`.
pub fn resolve_filename(url: &str, original: &str, hints: NameHints<'_>) -> String {
    if let Some(name) = hints
        .content_disposition
        .and_then(parse_content_disposition_filename)
    {
        return sanitize_filename(&name);
    }

    if let Some(name) = filename_from_url_path(url).filter(|n| n.contains('.')) {
        return sanitize_filename(&name);
    }

    let stem = file_stem(original);
    if let Some(ext) = hints.content_type.and_then(extension_for_content_type) {
        return sanitize_filename(&format!("{stem}{ext}"));
    }

    let lower = original.to_ascii_lowercase();
    if lower.ends_with(".torrent") || lower.ends_with(".nzb") {
        sanitize_filename(&format!("{stem}.bin"))
    } else {
        sanitize_filename(original)
    }
}

/// Final on-disk name: `<job_id>_<name>`, shortened so the `.part` file that
/// precedes it still fits in one path component.
pub fn prefixed_name(id: JobId, name: &str) -> String {
    fit_with_prefix(id, name, PART_SUFFIX.len())
}

/// `<tag>_<name>`, with `name` cut so `reserve` more bytes still fit in one
/// path component.
pub fn fit_with_prefix(tag: impl std::fmt::Display, name: &str, reserve: usize) -> String {
    let prefix = format!("{tag}_");
    let room = NAME_MAX.saturating_sub(prefix.len() + reserve);
    format!("{prefix}{}", truncate_name(name, room))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_HINTS: NameHints<'static> = NameHints {
        content_disposition: None,
        content_type: None,
    };

    #[test]
    fn content_disposition_wins() {
        let hints = NameHints {
            content_disposition: Some("attachment; filename=\"Real.Name.mkv\""),
            content_type: Some("video/mp4"),
        };
        assert_eq!(
            resolve_filename("https://cdn.example.com/x/file.zip", "Movie.torrent", hints),
            "Real.Name.mkv"
        );
    }

    #[test]
    fn url_segment_needs_extension() {
        assert_eq!(
            resolve_filename("https://cdn.example.com/dl/Show.S01.zip", "Show.nzb", NO_HINTS),
            "Show.S01.zip"
        );
        let hints = NameHints {
            content_disposition: None,
            content_type: Some("video/x-matroska; charset=binary"),
        };
        assert_eq!(
            resolve_filename("https://cdn.example.com/dl/8f3a9c", "Movie.2024.torrent", hints),
            "Movie.2024.mkv"
        );
    }

    #[test]
    fn falls_back_to_original() {
        assert_eq!(
            resolve_filename("https://cdn.example.com/dl/8f3a9c", "Movie.torrent", NO_HINTS),
            "Movie.bin"
        );
        assert_eq!(
            resolve_filename("https://cdn.example.com/dl/8f3a9c", "Show.NZB", NO_HINTS),
            "Show.bin"
        );
        assert_eq!(
            resolve_filename("https://cdn.example.com/", "weird:name", NO_HINTS),
            "weird_name"
        );
    }

    #[test]
    fn content_type_table() {
        assert_eq!(extension_for_content_type("video/mp4"), Some(".mp4"));
        assert_eq!(extension_for_content_type("video/x-msvideo"), Some(".avi"));
        assert_eq!(extension_for_content_type("Application/ZIP"), Some(".zip"));
        assert_eq!(extension_for_content_type("application/x-zip-compressed"), Some(".zip"));
        assert_eq!(extension_for_content_type("application/x-bittorrent"), Some(".torrent"));
        assert_eq!(extension_for_content_type("application/x-nzb"), Some(".nzb"));
        assert_eq!(extension_for_content_type("application/octet-stream"), None);
    }

    #[test]
    fn stems_and_prefix() {
        assert_eq!(file_stem("a.b.torrent"), "a.b");
        assert_eq!(file_stem(".hidden"), ".hidden");
        assert_eq!(file_stem("plain"), "plain");
        assert_eq!(prefixed_name(42, "x.mkv"), "42_x.mkv");
    }

    #[test]
    fn prefixed_name_leaves_room_for_part_suffix() {
        let hint = format!("attachment; filename=\"{}.mkv\"", "a".repeat(300));
        let hints = NameHints {
            content_disposition: Some(&hint),
            content_type: None,
        };
        let name = prefixed_name(123456, &resolve_filename("https://cdn.example/x", "a.torrent", hints));
        assert!(name.starts_with("123456_"));
        assert!(name.ends_with(".mkv"));
        assert_eq!(name.len() + PART_SUFFIX.len(), NAME_MAX);
    }
}
