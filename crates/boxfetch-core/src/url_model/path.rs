//! Filename hint from a URL path.

use super::percent::percent_decode;

/// Last non-empty path segment of `url`, percent-decoded. Query and fragment are ignored.
///
/// Returns `None` if the URL cannot be parsed or the path is empty/root.
pub fn filename_from_url_path(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segment = parsed
        .path_segments()?
        .filter(|s| !s.is_empty())
        .last()?;
    let decoded = percent_decode(segment);
    match decoded.as_str() {
        "." | ".." => None,
        _ => Some(decoded),
    }
}
