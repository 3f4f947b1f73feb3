//! Job failure taxonomy.
//!
//! Every phase of the worker returns `Result<_, JobError>`; the loop turns the
//! error into the job's terminal status (`cancelled` for `Cancelled`, `failed`
//! with the display text otherwise). `Interrupted` is the exception: the worker
//! is stopping and the job is left where it is for the next start.

use crate::provider::ProviderError;

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// Credentials or other required configuration are missing.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The uploaded description file is gone.
    #[error("missing content: {0}")]
    MissingContent(String),

    #[error("provider request failed: {0}")]
    ProviderRequest(#[from] ProviderError),

    /// The job was cancelled or removed while it was being processed.
    #[error("cancelled")]
    Cancelled,

    /// The worker is shutting down; the job keeps its current status.
    #[error("interrupted by worker shutdown")]
    Interrupted,

    #[error("transfer failed: {0}")]
    TransferIo(String),

    /// Only ever logged; an archive that can't be unpacked is delivered as-is.
    #[error("archive extraction failed: {0}")]
    ArchiveExtraction(String),

    #[error("job store error: {0:#}")]
    Store(anyhow::Error),
}

impl From<anyhow::Error> for JobError {
    fn from(err: anyhow::Error) -> Self {
        JobError::Store(err)
    }
}

impl JobError {
    pub(crate) fn transfer_io(context: &str, err: impl std::fmt::Display) -> Self {
        JobError::TransferIo(format!("{context}: {err}"))
    }
}
