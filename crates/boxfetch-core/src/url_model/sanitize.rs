//! Filename sanitization for output and upload files.

use super::DEFAULT_FILENAME;

/// Linux NAME_MAX.
pub const NAME_MAX: usize = 255;

/// Longest extension kept intact when a name is shortened.
const MAX_KEPT_EXTENSION: usize = 16;

const RESERVED: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Makes `name` safe to join onto a target directory.
///
/// Reserved characters (`< > : " / \ | ? *`), NUL and control characters become `_`;
/// leading/trailing dots and spaces are trimmed; the result is capped at 255 bytes.
/// Empty results fall back to `download.bin`.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| {
            if RESERVED.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    let out = truncate_name(trim_edges(&replaced), NAME_MAX);
    if out.is_empty() {
        DEFAULT_FILENAME.to_string()
    } else {
        out
    }
}

/// Shortens `name` to at most `max` bytes on a char boundary, keeping a short
/// extension such as `.mkv`.
pub fn truncate_name(name: &str, max: usize) -> String {
    if name.len() <= max {
        return name.to_string();
    }
    let ext = match name.rfind('.') {
        Some(i) if i > 0 && name.len() - i <= MAX_KEPT_EXTENSION.min(max) => &name[i..],
        _ => "",
    };
    let stem = &name[..name.len() - ext.len()];
    let mut cut = max - ext.len();
    while !stem.is_char_boundary(cut) {
        cut -= 1;
    }
    let stem = trim_edges(&stem[..cut]);
    if stem.is_empty() {
        return trim_edges(ext).to_string();
    }
    format!("{stem}{ext}")
}

fn trim_edges(s: &str) -> &str {
    s.trim_matches(|c: char| c == '.' || c == ' ')
}

/// Conservative name for stored uploads: ASCII letters, digits, `.`, `_` and `-` are kept,
/// everything else becomes `_`.
pub fn safe_upload_name(name: &str) -> String {
    let out: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if out.is_empty() {
        "upload".to_string()
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_and_separators_replaced() {
        assert_eq!(sanitize_filename("a/b:c*d?.mkv"), "a_b_c_d_.mkv");
        assert_eq!(sanitize_filename("x<y>|z\"\\w"), "x_y__z__w");
        assert_eq!(sanitize_filename("tab\there\0.bin"), "tab_here_.bin");
    }

    #[test]
    fn traversal_is_neutralized() {
        let s = sanitize_filename("../../etc/passwd");
        assert!(!s.contains('/'));
        assert_ne!(s, "..");
        assert_eq!(sanitize_filename(".."), DEFAULT_FILENAME);
        assert_eq!(sanitize_filename(" . "), DEFAULT_FILENAME);
        assert_eq!(sanitize_filename(""), DEFAULT_FILENAME);
    }

    #[test]
    fn edges_trimmed_inner_spaces_kept() {
        assert_eq!(sanitize_filename("  My Movie (2024).mkv. "), "My Movie (2024).mkv");
    }

    #[test]
    fn length_capped_on_char_boundary() {
        let long = "é".repeat(200);
        let s = sanitize_filename(&long);
        assert!(s.len() <= 255);
        assert!(s.chars().all(|c| c == 'é'));
    }

    #[test]
    fn long_names_keep_their_extension() {
        let long = format!("{}.mkv", "a".repeat(300));
        let s = sanitize_filename(&long);
        assert_eq!(s.len(), NAME_MAX);
        assert!(s.ends_with("a.mkv"));

        assert_eq!(truncate_name("short.mkv", 20), "short.mkv");
        assert_eq!(truncate_name("abcdefghij.mkv", 8), "abcd.mkv");
        // Extension longer than the budget allows is cut with the rest.
        assert_eq!(truncate_name("ab.verylongextension", 6), "ab.ver");
        assert_eq!(truncate_name("éééé.mkv", 7), "é.mkv");
    }

    #[test]
    fn upload_names() {
        assert_eq!(safe_upload_name("Some Show [1080p].torrent"), "Some_Show__1080p_.torrent");
        assert_eq!(safe_upload_name("ok-name_1.nzb"), "ok-name_1.nzb");
        assert_eq!(safe_upload_name(""), "upload");
    }
}
