//! Import notifications to downstream library scanners (Sonarr, Radarr, Whisparr).

use anyhow::{bail, Result};
use serde_json::json;
use std::path::Path;
use std::time::Duration;

use crate::http::{self, Body, Request};
use crate::job_store::{keys, Category, JobStore};

/// A scanner with both its URL and API key configured.
#[derive(Clone, PartialEq, Eq)]
pub struct Scanner {
    pub category: Category,
    pub base_url: String,
    pub api_key: String,
}

impl std::fmt::Debug for Scanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner")
            .field("category", &self.category)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Command the scanner runs to import a finished download.
pub fn scan_command(category: Category) -> &'static str {
    match category {
        Category::Radarr => "DownloadedMoviesScan",
        Category::Sonarr | Category::Whisparr => "DownloadedEpisodesScan",
    }
}

/// Every scanner whose `<name>_url` and `<name>_api_key` settings are both non-empty.
pub async fn configured_scanners(store: &JobStore) -> Result<Vec<Scanner>> {
    let mut scanners = Vec::new();
    for category in Category::ALL {
        let url = store.get_nonempty_setting(&keys::scanner_url(category)).await?;
        let key = store
            .get_nonempty_setting(&keys::scanner_api_key(category))
            .await?;
        if let (Some(base_url), Some(api_key)) = (url, key) {
            scanners.push(Scanner {
                category,
                base_url,
                api_key,
            });
        }
    }
    Ok(scanners)
}

/// Asks `scanner` to import `path` (moving it into the library).
pub async fn notify(scanner: &Scanner, path: &Path) -> Result<()> {
    let base = format!("{}/api/v3/command", scanner.base_url.trim_end_matches('/'));
    let url = http::with_query(&base, &[("apikey", scanner.api_key.as_str())])?;
    let body = json!({
        "name": scan_command(scanner.category),
        "path": path.to_string_lossy(),
        "importMode": "Move",
    });
    let req = Request::post(url, Body::Json(body.to_string())).timeout(Duration::from_secs(30));
    let resp = http::send_async(req).await?;
    if !resp.is_success() {
        bail!(
            "{} rejected scan of {}: HTTP {} {}",
            scanner.category,
            path.display(),
            resp.status,
            resp.snippet()
        );
    }
    tracing::info!(scanner = %scanner.category, path = %path.display(), "library scan requested");
    Ok(())
}
