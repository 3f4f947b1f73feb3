//! Poll/acquire phase: wait for the provider to hand out a download link.
//!
//! Each attempt re-reads the row before and after waiting for a provider slot, so a
//! cancel or removal is noticed before the next provider call. Hard poll failures are tolerated up to `max_poll_errors` in a
//! row; past that the job fails with the last error.

use super::transition::transition;
use super::{limited_call, ResolvedSettings, Shared};
use crate::error::JobError;
use crate::job_store::{Job, JobStatus};
use crate::provider::ProviderError;

/// Progress ceiling while the provider is still fetching.
const REMOTE_PROGRESS_CEILING: u8 = 95;
/// Progress recorded once a download link exists.
const READY_PROGRESS: u8 = 10;

/// Polls until the job is ready (`Some`, now `downloading`) or the attempt budget
/// runs out (`None`, still `submitted`, re-claimed on a later tick).
pub(super) async fn poll_until_ready(
    shared: &Shared,
    job: Job,
    resolved: &ResolvedSettings,
) -> Result<Option<Job>, JobError> {
    let auth = resolved.require_auth()?;
    let reference = job.provider_ref.clone().ok_or_else(|| ProviderError::Malformed {
        operation: "poll",
        message: format!("job {} has no provider reference", job.id),
    })?;
    let tuning = &shared.tuning;
    let mut consecutive_errors = 0u32;

    for attempt in 0..tuning.poll_attempts {
        if attempt > 0 && !shared.stop.sleep(tuning.poll_interval()).await {
            return Err(JobError::Interrupted);
        }
        let current = match shared.store.get(job.id).await? {
            Some(current) if current.status == JobStatus::Submitted => current,
            _ => return Err(JobError::Cancelled),
        };

        let outcome = limited_call(
            shared,
            job.id,
            JobStatus::Submitted,
            shared.provider.poll(auth, &reference, current.source_type),
        )
        .await?;
        let status = match outcome {
            Ok(status) => {
                consecutive_errors = 0;
                status
            }
            Err(e) => {
                consecutive_errors += 1;
                if consecutive_errors >= tuning.max_poll_errors.max(1) {
                    return Err(e.into());
                }
                tracing::warn!(
                    job_id = job.id,
                    consecutive_errors,
                    "poll failed, will retry: {e}"
                );
                continue;
            }
        };

        if let (true, Some(url)) = (status.ready, status.download_url) {
            tracing::info!(job_id = job.id, "download link ready");
            let ready = transition(&shared.store, &current, JobStatus::Downloading, |j| {
                j.provider_download_url = Some(url);
                j.progress = j.progress.max(READY_PROGRESS);
            })
            .await?;
            return Ok(Some(ready));
        }

        if let Some(reported) = status.progress {
            let target = current.progress.max(reported).min(REMOTE_PROGRESS_CEILING);
            if target > current.progress {
                transition(&shared.store, &current, JobStatus::Submitted, |j| {
                    j.progress = target;
                })
                .await?;
            }
        }
        tracing::debug!(job_id = job.id, attempt, progress = ?status.progress, "not ready yet");
    }

    tracing::debug!(
        job_id = job.id,
        attempts = tuning.poll_attempts,
        "still not ready; will poll again later"
    );
    Ok(None)
}
