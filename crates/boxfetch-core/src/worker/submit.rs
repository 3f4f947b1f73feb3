//! Submission phase: upload the description file, record the provider reference.

use super::transition::transition;
use super::{limited_call, ResolvedSettings, Shared};
use crate::error::JobError;
use crate::job_store::{keys, Job, JobId, JobStatus, JobStore};

/// Progress recorded once the provider accepted the job.
const SUBMITTED_PROGRESS: u8 = 5;

/// Brings a claimed job to `submitted`. Idempotent: a job that already has a
/// provider reference advances without calling the provider.
pub(super) async fn ensure_submitted(
    shared: &Shared,
    job: Job,
    resolved: &ResolvedSettings,
) -> Result<Job, JobError> {
    if job.status == JobStatus::Submitted {
        return Ok(job);
    }
    if job.provider_ref.is_some() {
        tracing::info!(job_id = job.id, "already submitted; skipping upload");
        return transition(&shared.store, &job, JobStatus::Submitted, |_| {}).await;
    }

    let auth = resolved.require_auth()?;
    let content = read_upload(&shared.store, job.id).await?;
    let submitted = limited_call(
        shared,
        job.id,
        job.status,
        shared
            .provider
            .submit(auth, &job.filename, content, job.source_type),
    )
    .await??;
    tracing::info!(job_id = job.id, reference = %submitted.reference, "provider accepted job");

    transition(&shared.store, &job, JobStatus::Submitted, |j| {
        j.provider_ref = Some(submitted.reference);
        j.progress = j.progress.max(SUBMITTED_PROGRESS);
    })
    .await
}

/// Bytes of the job's uploaded description file.
async fn read_upload(store: &JobStore, id: JobId) -> Result<Vec<u8>, JobError> {
    let path = store
        .get_nonempty_setting(&keys::upload_path(id))
        .await?
        .ok_or_else(|| JobError::MissingContent(format!("no upload recorded for job {id}")))?;
    tokio::fs::read(&path)
        .await
        .map_err(|e| JobError::MissingContent(format!("{path}: {e}")))
}
