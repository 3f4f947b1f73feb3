//! Remote fetch-and-cache provider.
//!
//! The worker only sees the `Provider` trait: submit a description file, poll a
//! reference until a download link exists, and issue control actions. `TorboxClient`
//! is the production implementation; tests substitute their own.

pub mod normalize;
mod torbox;

pub use torbox::TorboxClient;

use async_trait::async_trait;

use crate::job_store::SourceType;

/// Credentials and endpoint for one provider call.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderAuth {
    pub base_url: String,
    pub api_key: String,
}

impl std::fmt::Debug for ProviderAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderAuth")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Reference id assigned by the provider to a submitted job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitResult {
    pub reference: String,
}

/// Readiness report for a submitted job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusResult {
    /// True only once a download link was obtained.
    pub ready: bool,
    pub download_url: Option<String>,
    /// Remote progress percentage, when reported.
    pub progress: Option<u8>,
}

impl StatusResult {
    pub fn pending(progress: Option<u8>) -> Self {
        Self {
            ready: false,
            download_url: None,
            progress,
        }
    }

    pub fn ready(download_url: String, progress: Option<u8>) -> Self {
        Self {
            ready: true,
            download_url: Some(download_url),
            progress,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    Delete,
}

impl ControlAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ControlAction::Delete => "delete",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("{operation} returned HTTP {status}: {body}")]
    Http {
        operation: &'static str,
        status: u32,
        body: String,
    },

    #[error("{operation} returned invalid JSON: {source}")]
    InvalidJson {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{operation}: {message}")]
    Malformed {
        operation: &'static str,
        message: String,
    },

    #[error("transport error: {0:#}")]
    Transport(anyhow::Error),
}

#[async_trait]
pub trait Provider: Send + Sync {
    /// Uploads a `.torrent`/`.nzb` file and returns the provider's reference.
    async fn submit(
        &self,
        auth: &ProviderAuth,
        filename: &str,
        content: Vec<u8>,
        kind: SourceType,
    ) -> Result<SubmitResult, ProviderError>;

    /// Reports whether `reference` is ready, with its download link once it is.
    async fn poll(
        &self,
        auth: &ProviderAuth,
        reference: &str,
        kind: SourceType,
    ) -> Result<StatusResult, ProviderError>;

    async fn control(
        &self,
        auth: &ProviderAuth,
        reference: &str,
        kind: SourceType,
        action: ControlAction,
    ) -> Result<(), ProviderError>;
}
