//! TorBox API client over libcurl.
//!
//! Endpoints live under `{base_url}/v1/api`. Every call carries the key three ways
//! (`Authorization: Bearer`, `X-API-Key`, `token` query parameter) since the API
//! accepts different ones on different endpoints.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

use super::normalize;
use super::{ControlAction, Provider, ProviderAuth, ProviderError, StatusResult, SubmitResult};
use crate::http::{self, Body, Request, Response};
use crate::job_store::SourceType;

/// Statuses from `torrents/requestdl` that mean "not ready yet".
const TORRENT_LINK_PENDING: &[u32] = &[404, 422, 500];
/// Statuses from `usenet/requestdl` that mean "not ready yet".
const USENET_LINK_PENDING: &[u32] = &[404, 500];

#[derive(Debug, Clone)]
pub struct TorboxClient {
    timeout: Duration,
}

impl Default for TorboxClient {
    fn default() -> Self {
        Self::new()
    }
}

impl TorboxClient {
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(60),
        }
    }

    fn endpoint(
        &self,
        auth: &ProviderAuth,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<String, ProviderError> {
        let base = format!("{}/v1/api/{}", auth.base_url.trim_end_matches('/'), path);
        let mut all: Vec<(&str, &str)> = params.to_vec();
        all.push(("token", auth.api_key.as_str()));
        http::with_query(&base, &all).map_err(ProviderError::Transport)
    }

    fn authorized(&self, auth: &ProviderAuth, req: Request) -> Request {
        req.timeout(self.timeout)
            .header(format!("Authorization: Bearer {}", auth.api_key))
            .header(format!("X-API-Key: {}", auth.api_key))
    }

    async fn send(&self, req: Request) -> Result<Response, ProviderError> {
        http::send_async(req).await.map_err(ProviderError::Transport)
    }

    async fn get(
        &self,
        auth: &ProviderAuth,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Response, ProviderError> {
        let url = self.endpoint(auth, path, params)?;
        self.send(self.authorized(auth, Request::get(url))).await
    }

    /// GET that must succeed and return JSON.
    async fn get_json(
        &self,
        operation: &'static str,
        auth: &ProviderAuth,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Value, ProviderError> {
        let resp = self.get(auth, path, params).await?;
        expect_json(operation, &resp)
    }

    async fn torrent_status(
        &self,
        auth: &ProviderAuth,
        reference: &str,
    ) -> Result<StatusResult, ProviderError> {
        let listing = self
            .get_json("torrents/mylist", auth, "torrents/mylist", &[])
            .await?;
        let Some(listed) = normalize::find_listed(&listing, reference, SourceType::Torrent) else {
            tracing::debug!(reference, "torrent not listed yet, still processing");
            return Ok(StatusResult::pending(None));
        };
        let mut progress = normalize::progress_of(listed);
        let mut torrent_id = normalize::torrent_id_of(listed);

        // Details are optional; the listing is enough to continue.
        match self
            .get_json("torrents/torrentinfo", auth, "torrents/torrentinfo", &[("hash", reference)])
            .await
        {
            Ok(details) => {
                let details = normalize::envelope(&details);
                progress = normalize::progress_of(details).or(progress);
                torrent_id = normalize::torrent_id_of(details).or(torrent_id);
            }
            Err(e) => tracing::debug!(reference, "torrentinfo unavailable: {e}"),
        }

        match self.torrent_link(auth, reference, torrent_id.as_deref()).await? {
            Some(url) => Ok(StatusResult::ready(url, Some(ready_progress(progress)))),
            None => Ok(StatusResult::pending(progress)),
        }
    }

    /// Tries the parameter combinations `requestdl` accepts until one yields a link.
    async fn torrent_link(
        &self,
        auth: &ProviderAuth,
        hash: &str,
        torrent_id: Option<&str>,
    ) -> Result<Option<String>, ProviderError> {
        let mut attempts: Vec<Vec<(&str, &str)>> = Vec::new();
        match torrent_id {
            Some(id) if id != hash => {
                attempts.push(vec![("torrent_id", id)]);
                attempts.push(vec![("hash", hash)]);
                attempts.push(vec![("torrent_id", id), ("hash", hash)]);
            }
            _ => attempts.push(vec![("torrent_id", torrent_id.unwrap_or(hash))]),
        }

        for mut params in attempts {
            params.push(("redirect", "false"));
            params.push(("zip_link", "true"));
            let resp = self.get(auth, "torrents/requestdl", &params).await?;
            if TORRENT_LINK_PENDING.contains(&resp.status) {
                continue;
            }
            if !resp.is_success() {
                tracing::debug!(hash, status = resp.status, "requestdl refused: {}", resp.snippet());
                return Ok(None);
            }
            return Ok(normalize::download_link(&expect_json("torrents/requestdl", &resp)?));
        }
        Ok(None)
    }

    async fn usenet_status(
        &self,
        auth: &ProviderAuth,
        reference: &str,
    ) -> Result<StatusResult, ProviderError> {
        let listing = self
            .get_json("usenet/mylist", auth, "usenet/mylist", &[])
            .await?;
        let listed = normalize::find_listed(&listing, reference, SourceType::Nzb);
        if listed.is_none() {
            tracing::debug!(reference, "usenet download not listed yet");
        }
        let progress = listed.and_then(normalize::progress_of);

        let resp = self
            .get(
                auth,
                "usenet/requestdl",
                &[
                    ("usenet_id", reference),
                    ("redirect", "false"),
                    ("zip_link", "false"),
                ],
            )
            .await?;
        if USENET_LINK_PENDING.contains(&resp.status) {
            return Ok(StatusResult::pending(progress));
        }
        if !resp.is_success() {
            tracing::debug!(reference, status = resp.status, "usenet requestdl refused: {}", resp.snippet());
            return Ok(StatusResult::pending(progress));
        }
        match normalize::download_link(&expect_json("usenet/requestdl", &resp)?) {
            Some(url) => Ok(StatusResult::ready(url, Some(ready_progress(progress)))),
            None => Ok(StatusResult::pending(progress)),
        }
    }
}

/// Remote progress reported alongside a ready link; unknown or zero reads as done.
fn ready_progress(progress: Option<u8>) -> u8 {
    match progress {
        Some(p) if p > 0 => p,
        _ => 100,
    }
}

fn expect_json(operation: &'static str, resp: &Response) -> Result<Value, ProviderError> {
    if !resp.is_success() {
        return Err(ProviderError::Http {
            operation,
            status: resp.status,
            body: resp.snippet(),
        });
    }
    resp.json()
        .map_err(|source| ProviderError::InvalidJson { operation, source })
}

#[async_trait]
impl Provider for TorboxClient {
    async fn submit(
        &self,
        auth: &ProviderAuth,
        filename: &str,
        content: Vec<u8>,
        kind: SourceType,
    ) -> Result<SubmitResult, ProviderError> {
        let (operation, path) = match kind {
            SourceType::Torrent => ("torrents/createtorrent", "torrents/createtorrent"),
            SourceType::Nzb => ("usenet/createusenetdownload", "usenet/createusenetdownload"),
        };
        let url = format!("{}/v1/api/{}", auth.base_url.trim_end_matches('/'), path);
        let body = Body::Multipart {
            field: "file".to_string(),
            filename: filename.to_string(),
            content,
        };
        let resp = self
            .send(self.authorized(auth, Request::post(url, body)))
            .await?;
        let payload = expect_json(operation, &resp)?;
        let reference =
            normalize::submit_reference(&payload, kind).ok_or_else(|| ProviderError::Malformed {
                operation,
                message: format!("response has no job id: {}", resp.snippet()),
            })?;
        tracing::info!(kind = kind.as_str(), reference = %reference, "submitted {filename}");
        Ok(SubmitResult { reference })
    }

    async fn poll(
        &self,
        auth: &ProviderAuth,
        reference: &str,
        kind: SourceType,
    ) -> Result<StatusResult, ProviderError> {
        match kind {
            SourceType::Torrent => self.torrent_status(auth, reference).await,
            SourceType::Nzb => self.usenet_status(auth, reference).await,
        }
    }

    async fn control(
        &self,
        auth: &ProviderAuth,
        reference: &str,
        kind: SourceType,
        action: ControlAction,
    ) -> Result<(), ProviderError> {
        let (operation, body) = match kind {
            SourceType::Torrent => (
                "torrents/controltorrent",
                json!({"operation": action.as_str(), "action": action.as_str(), "torrent_id": reference}),
            ),
            SourceType::Nzb => (
                "usenet/controlusenetdownload",
                json!({"operation": action.as_str(), "action": action.as_str(), "usenet_id": reference}),
            ),
        };
        let url = self.endpoint(auth, operation, &[])?;
        let resp = self
            .send(self.authorized(auth, Request::post(url, Body::Json(body.to_string()))))
            .await?;
        if !resp.is_success() {
            return Err(ProviderError::Http {
                operation,
                status: resp.status,
                body: resp.snippet(),
            });
        }
        Ok(())
    }
}
