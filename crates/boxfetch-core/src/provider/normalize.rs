//! Field lookup over provider JSON payloads.
//!
//! Provider responses vary by endpoint and over time: ids live under different
//! keys, lists come bare or wrapped, links come as strings or objects. All of that
//! guessing is here, as pure functions over `serde_json::Value`.

use serde_json::Value;

use crate::job_store::SourceType;

/// Loose truthiness: null, false, 0, "" and empty containers are false.
fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// First key of `keys` whose value in `obj` is truthy.
fn first_truthy<'a>(obj: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().filter_map(|k| obj.get(*k)).find(|v| truthy(v))
}

/// Id-like scalar as a string. Null, empty and the literal "none" are absent.
fn id_string(v: &Value) -> Option<String> {
    let s = match v {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if s.is_empty() || s.eq_ignore_ascii_case("none") || s.eq_ignore_ascii_case("null") {
        None
    } else {
        Some(s)
    }
}

/// The `data` member of an envelope when it is truthy, else the payload itself.
pub fn envelope(payload: &Value) -> &Value {
    match payload.get("data") {
        Some(data) if truthy(data) => data,
        _ => payload,
    }
}

/// Reference id from a submit response.
///
/// Torrents prefer the info hash (what the status endpoints are keyed on) and fall
/// back to numeric ids; usenet downloads use their download id.
pub fn submit_reference(payload: &Value, kind: SourceType) -> Option<String> {
    if !payload.is_object() {
        return None;
    }
    let data = envelope(payload);
    let candidates: Vec<Option<&Value>> = match kind {
        SourceType::Torrent => {
            let torrent = data.get("torrent").filter(|t| t.is_object());
            vec![
                data.get("hash"),
                torrent.and_then(|t| t.get("hash")),
                data.get("torrent_id"),
                data.get("id"),
                torrent.and_then(|t| t.get("id")),
                torrent.and_then(|t| t.get("torrent_id")),
            ]
        }
        SourceType::Nzb => {
            let nested = first_truthy(data, &["usenet", "download"]).filter(|u| u.is_object());
            vec![
                data.get("usenetdownload_id"),
                data.get("usenet_id"),
                data.get("id"),
                nested.and_then(|u| u.get("id")),
            ]
        }
    };
    candidates.into_iter().flatten().find_map(id_string)
}

/// Entries of a listing response (`mylist`), whatever the wrapping.
pub fn listed_items(payload: &Value) -> Vec<&Value> {
    let inner = payload.get("data").unwrap_or(payload);
    let list = match inner {
        Value::Array(_) => Some(inner),
        Value::Object(_) => first_truthy(inner, &["items", "data", "list"]),
        _ => None,
    };
    match list {
        Some(Value::Array(items)) => items.iter().filter(|i| i.is_object()).collect(),
        Some(obj @ Value::Object(_)) => vec![obj],
        _ => Vec::new(),
    }
}

/// The listing entry for `reference`, if the provider lists it yet.
pub fn find_listed<'a>(payload: &'a Value, reference: &str, kind: SourceType) -> Option<&'a Value> {
    let (keys, case_insensitive): (&[&str], bool) = match kind {
        SourceType::Torrent => (&["hash", "infohash", "torrent_id", "id"][..], true),
        SourceType::Nzb => (&["usenetdownload_id", "usenet_id", "id", "download_id"][..], false),
    };
    listed_items(payload).into_iter().find(|item| {
        keys.iter()
            .filter_map(|k| item.get(*k).and_then(id_string))
            .any(|id| {
                if case_insensitive {
                    id.eq_ignore_ascii_case(reference)
                } else {
                    id == reference
                }
            })
    })
}

/// Progress percentage from `progress`, `percentage` or `percent_done`, truncated to 0..=100.
pub fn progress_of(info: &Value) -> Option<u8> {
    let raw = first_truthy(info, &["progress", "percentage", "percent_done"])
        .or_else(|| info.get("progress").filter(|v| !v.is_null()))?;
    let value = match raw {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !value.is_finite() {
        return None;
    }
    Some(value.clamp(0.0, 100.0) as u8)
}

/// Numeric torrent id from a listing or details entry.
pub fn torrent_id_of(info: &Value) -> Option<String> {
    ["torrent_id", "id", "torrentId", "torrentID"]
        .iter()
        .filter_map(|k| info.get(*k))
        .find_map(id_string)
}

/// Download link from a `requestdl` response: `data` as a string, or its
/// `download_url` / `link` / `url` member.
pub fn download_link(payload: &Value) -> Option<String> {
    let data = match payload {
        Value::Object(_) => envelope(payload),
        other => other,
    };
    let link = match data {
        Value::String(s) => Some(s.as_str()),
        Value::Object(_) => first_truthy(data, &["download_url", "link", "url"]).and_then(Value::as_str),
        _ => None,
    }?;
    let link = link.trim();
    (!link.is_empty()).then(|| link.to_string())
}
