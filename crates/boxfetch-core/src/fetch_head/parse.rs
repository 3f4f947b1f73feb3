//! Parse HTTP response header lines into `ResponseHead`.

use super::ResponseHead;

/// Parse collected header lines. When redirects were followed the lines of every
/// hop are present; only the block after the last status line counts.
pub(crate) fn parse_headers(lines: &[String]) -> ResponseHead {
    let start = lines
        .iter()
        .rposition(|l| l.starts_with("HTTP/"))
        .unwrap_or(0);

    let mut head = ResponseHead::default();
    for line in &lines[start..] {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("HTTP/") {
            head.status = line
                .split_whitespace()
                .nth(1)
                .and_then(|code| code.parse().ok());
            continue;
        }
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim();
        let value = value.trim();
        if name.eq_ignore_ascii_case("content-length") {
            head.content_length = value.parse().ok();
        } else if name.eq_ignore_ascii_case("content-type") {
            head.content_type = Some(value.to_string());
        } else if name.eq_ignore_ascii_case("content-disposition") {
            head.content_disposition = Some(value.to_string());
        }
    }
    head
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_final_response() {
        let head = parse_headers(&lines(&[
            "HTTP/1.1 200 OK",
            "Content-Length: 12345",
            "Content-Type: video/x-matroska",
            "content-disposition: attachment; filename=\"a.mkv\"",
            "",
        ]));
        assert_eq!(head.status, Some(200));
        assert_eq!(head.content_length, Some(12345));
        assert_eq!(head.content_type.as_deref(), Some("video/x-matroska"));
        assert_eq!(
            head.content_disposition.as_deref(),
            Some("attachment; filename=\"a.mkv\"")
        );
    }

    #[test]
    fn only_last_hop_counts_after_redirect() {
        let head = parse_headers(&lines(&[
            "HTTP/1.1 302 Found",
            "Location: https://cdn.example.com/x",
            "Content-Disposition: attachment; filename=redirect.html",
            "",
            "HTTP/2 200",
            "content-length: 10",
            "",
        ]));
        assert_eq!(head.status, Some(200));
        assert_eq!(head.content_length, Some(10));
        assert!(head.content_disposition.is_none());
    }

    #[test]
    fn garbage_is_ignored() {
        let head = parse_headers(&lines(&["no colon here", "Content-Length: nope"]));
        assert_eq!(head, ResponseHead::default());
    }
}
