//! Content-Disposition filename extraction.

use super::percent::percent_decode;

/// Filename carried by a Content-Disposition header value, if any.
///
/// Parameters are split on `;` outside quotes. `filename*` (RFC 5987,
/// `charset'lang'pct-encoded`) wins over `filename`; both forms are
/// percent-decoded and quoted values are unescaped.
pub fn parse_content_disposition_filename(header_value: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;

    for param in split_params(header_value) {
        let Some((name, value)) = param.split_once('=') else {
            continue;
        };
        let name = name.trim();
        let value = value.trim();
        if name.eq_ignore_ascii_case("filename*") {
            let encoded = match value.splitn(3, '\'').collect::<Vec<_>>()[..] {
                [_charset, _lang, rest] => rest,
                _ => value,
            };
            extended = Some(percent_decode(&unquote(encoded)));
        } else if name.eq_ignore_ascii_case("filename") {
            plain = Some(percent_decode(&unquote(value)));
        }
    }

    extended
        .filter(|s| !s.trim().is_empty())
        .or(plain)
        .filter(|s| !s.trim().is_empty())
}

/// Splits on `;` that are not inside a quoted string.
fn split_params(value: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut escaped = false;
    let mut start = 0;
    for (i, c) in value.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                parts.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&value[start..]);
    parts
}

/// Strips surrounding quotes and backslash escapes.
fn unquote(value: &str) -> String {
    let inner = match value.strip_prefix('"') {
        Some(rest) => rest.strip_suffix('"').unwrap_or(rest),
        None => return value.to_string(),
    };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}
