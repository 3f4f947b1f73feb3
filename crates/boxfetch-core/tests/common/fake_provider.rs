//! Scripted `Provider` for worker tests.

use async_trait::async_trait;
use boxfetch_core::job_store::SourceType;
use boxfetch_core::provider::{
    ControlAction, Provider, ProviderAuth, ProviderError, StatusResult, SubmitResult,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct FakeProvider {
    download_url: String,
    /// Polls answered "pending" before the link is handed out.
    pending_polls: usize,
    /// Progress reported by successive pending polls; the last value repeats.
    pending_progress: Vec<u8>,
    fail_polls: bool,
    pub submits: AtomicUsize,
    pub polls: AtomicUsize,
    pub deletes: AtomicUsize,
    pub submitted: Mutex<Vec<(String, Vec<u8>, SourceType)>>,
}

impl FakeProvider {
    pub fn ready_with(download_url: &str) -> Self {
        Self {
            download_url: download_url.to_string(),
            ..Self::default()
        }
    }

    pub fn pending_for(mut self, polls: usize) -> Self {
        self.pending_polls = polls;
        self
    }

    /// Never hands out a link.
    pub fn never_ready() -> Self {
        Self::default().pending_for(usize::MAX)
    }

    pub fn reporting(mut self, progress: &[u8]) -> Self {
        self.pending_progress = progress.to_vec();
        self
    }

    pub fn failing_polls() -> Self {
        Self {
            fail_polls: true,
            ..Self::default()
        }
    }

    pub fn submits(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for FakeProvider {
    async fn submit(
        &self,
        _auth: &ProviderAuth,
        filename: &str,
        content: Vec<u8>,
        kind: SourceType,
    ) -> Result<SubmitResult, ProviderError> {
        let n = self.submits.fetch_add(1, Ordering::SeqCst);
        self.submitted
            .lock()
            .unwrap()
            .push((filename.to_string(), content, kind));
        Ok(SubmitResult {
            reference: format!("ref-{n}"),
        })
    }

    async fn poll(
        &self,
        _auth: &ProviderAuth,
        _reference: &str,
        _kind: SourceType,
    ) -> Result<StatusResult, ProviderError> {
        let n = self.polls.fetch_add(1, Ordering::SeqCst);
        if self.fail_polls {
            return Err(ProviderError::Http {
                operation: "torrents/mylist",
                status: 503,
                body: "maintenance".into(),
            });
        }
        if n < self.pending_polls {
            let progress = self
                .pending_progress
                .get(n)
                .or(self.pending_progress.last())
                .copied()
                .unwrap_or(40);
            return Ok(StatusResult::pending(Some(progress)));
        }
        Ok(StatusResult::ready(self.download_url.clone(), Some(100)))
    }

    async fn control(
        &self,
        _auth: &ProviderAuth,
        _reference: &str,
        _kind: SourceType,
        action: ControlAction,
    ) -> Result<(), ProviderError> {
        assert_eq!(action, ControlAction::Delete);
        self.deletes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
