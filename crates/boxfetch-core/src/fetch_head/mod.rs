//! HTTP HEAD probing for artifact naming hints.
//!
//! The probe is advisory: callers treat any failure as "no hints".

mod parse;

pub(crate) use parse::parse_headers;

use anyhow::{Context, Result};
use std::str;
use std::time::Duration;

/// Headers of the final response of a HEAD or GET.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: Option<u32>,
    /// Total size in bytes, if `Content-Length` is present.
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
}

impl ResponseHead {
    pub fn is_success(&self) -> bool {
        matches!(self.status, Some(200..=299))
    }
}

/// Performs a HEAD request (following redirects) and returns the final response headers.
///
/// Runs in the current thread; use `probe_async` from async code.
pub fn probe(url: &str) -> Result<ResponseHead> {
    let mut headers: Vec<String> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url).context("invalid URL")?;
    easy.nobody(true)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.connect_timeout(Duration::from_secs(10))?;
    easy.timeout(Duration::from_secs(10))?;

    {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            if let Ok(s) = str::from_utf8(data) {
                headers.push(s.trim_end().to_string());
            }
            true
        })?;
        transfer.perform().context("HEAD request failed")?;
    }

    let head = parse_headers(&headers);
    if !head.is_success() {
        anyhow::bail!("HEAD returned HTTP {}", head.status.unwrap_or(0));
    }
    Ok(head)
}

/// `probe` on the blocking pool.
pub async fn probe_async(url: String) -> Result<ResponseHead> {
    tokio::task::spawn_blocking(move || probe(&url))
        .await
        .context("HEAD probe task panicked")?
}
