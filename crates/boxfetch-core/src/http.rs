//! Small blocking HTTP client over libcurl for JSON APIs (provider, library scanners).
//!
//! Requests run on the calling thread; `send_async` moves them onto the blocking pool.

use anyhow::{Context, Result};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone)]
pub enum Body {
    Empty,
    Json(String),
    /// Single-file `multipart/form-data` upload.
    Multipart {
        field: String,
        filename: String,
        content: Vec<u8>,
    },
}

#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: String,
    /// Full header lines, e.g. `Authorization: Bearer x`.
    pub headers: Vec<String>,
    pub body: Body,
    pub timeout: Duration,
}

impl Request {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: Vec::new(),
            body: Body::Empty,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn post(url: impl Into<String>, body: Body) -> Self {
        Self {
            method: Method::Post,
            body,
            ..Self::get(url)
        }
    }

    pub fn header(mut self, line: impl Into<String>) -> Self {
        self.headers.push(line.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Response {
    pub status: u32,
    pub body: Vec<u8>,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json(&self) -> std::result::Result<serde_json::Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Start of the body as text, for error messages.
    pub fn snippet(&self) -> String {
        let text = String::from_utf8_lossy(&self.body);
        let mut s: String = text.chars().take(200).collect();
        if text.chars().count() > 200 {
            s.push('…');
        }
        s
    }
}

/// `base` with `params` appended as an encoded query string.
pub fn with_query(base: &str, params: &[(&str, &str)]) -> Result<String> {
    let url = url::Url::parse_with_params(base, params)
        .with_context(|| format!("invalid URL {base}"))?;
    Ok(url.to_string())
}

/// Performs `req` and returns the status and full body. HTTP error statuses are not errors here.
pub fn send(req: &Request) -> Result<Response> {
    let mut easy = curl::easy::Easy::new();
    easy.url(&req.url).context("invalid URL")?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.connect_timeout(Duration::from_secs(15))?;
    easy.timeout(req.timeout)?;

    let mut list = curl::easy::List::new();
    for line in &req.headers {
        list.append(line)?;
    }
    // No `Expect: 100-continue` round trip for uploads.
    list.append("Expect:")?;

    match (&req.method, &req.body) {
        (Method::Get, _) => {}
        (Method::Post, Body::Empty) => {
            easy.post(true)?;
            easy.post_field_size(0)?;
        }
        (Method::Post, Body::Json(json)) => {
            list.append("Content-Type: application/json")?;
            easy.post(true)?;
            easy.post_fields_copy(json.as_bytes())?;
        }
        (Method::Post, Body::Multipart {
            field,
            filename,
            content,
        }) => {
            let mut form = curl::easy::Form::new();
            form.part(field)
                .buffer(filename, content.clone())
                .content_type("application/octet-stream")
                .add()?;
            easy.httppost(form)?;
        }
    }
    easy.http_headers(list)?;

    let mut body = Vec::new();
    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer
            .perform()
            .with_context(|| format!("request to {} failed", redact(&req.url)))?;
    }

    let status = easy.response_code().context("no response code")?;
    Ok(Response { status, body })
}

/// `send` on the blocking pool.
pub async fn send_async(req: Request) -> Result<Response> {
    tokio::task::spawn_blocking(move || send(&req))
        .await
        .context("HTTP task panicked")?
}

/// URL without its query string (which may carry credentials).
pub fn redact(url: &str) -> &str {
    url.split_once('?').map(|(base, _)| base).unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_is_encoded() {
        let url = with_query("https://api.example.com/v1/api/x", &[("hash", "a b"), ("token", "k&1")])
            .unwrap();
        assert_eq!(url, "https://api.example.com/v1/api/x?hash=a+b&token=k%261");
        assert_eq!(redact(&url), "https://api.example.com/v1/api/x");
    }

    #[test]
    fn snippet_is_bounded() {
        let resp = Response {
            status: 500,
            body: vec![b'x'; 500],
        };
        assert!(!resp.is_success());
        assert_eq!(resp.snippet().chars().count(), 201);
    }
}
