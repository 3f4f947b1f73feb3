//! Guarded job writes for the scheduler loop.
//!
//! Every write names the status it observed; the store applies it only if the row
//! still holds that status, so a concurrent cancel or removal is never overwritten.

use anyhow::anyhow;

use crate::error::JobError;
use crate::job_store::{Job, JobId, JobStatus, JobStore};

/// Moves `job` to `next` (or rewrites it in place when `next == job.status`) after
/// applying `edit`. A row that vanished or moved on yields `JobError::Cancelled`.
pub(super) async fn transition<F>(
    store: &JobStore,
    job: &Job,
    next: JobStatus,
    edit: F,
) -> Result<Job, JobError>
where
    F: FnOnce(&mut Job),
{
    if next != job.status && !job.status.can_transition_to(next) {
        return Err(JobError::Store(anyhow!(
            "job {}: illegal transition {} -> {}",
            job.id,
            job.status,
            next
        )));
    }
    let mut updated = job.clone();
    updated.status = next;
    edit(&mut updated);
    if !store.update_if_status(&updated, job.status).await? {
        tracing::info!(job_id = job.id, "job changed underneath the worker; abandoning");
        return Err(JobError::Cancelled);
    }
    if next != job.status {
        tracing::debug!(job_id = job.id, "{} -> {}", job.status, next);
    }
    Ok(updated)
}

/// Records the outcome of a failed phase.
///
/// `Cancelled` cancels the row unless it is already terminal; `Interrupted` leaves it
/// for the next start; anything else marks it `failed` with the error text unless a
/// fresh read shows it already finished.
pub(super) async fn record_failure(store: &JobStore, id: JobId, err: JobError) {
    match err {
        JobError::Interrupted => {
            tracing::info!(job_id = id, "interrupted; will resume on next start");
        }
        JobError::Cancelled => match store.cancel(id).await {
            Ok(true) => tracing::info!(job_id = id, "job cancelled"),
            Ok(false) => tracing::debug!(job_id = id, "job already gone or finished"),
            Err(e) => tracing::warn!(job_id = id, "could not mark job cancelled: {e:#}"),
        },
        err => {
            if let Err(e) = mark_failed(store, id, &err).await {
                tracing::warn!(job_id = id, "could not record failure ({err}): {e:#}");
            }
        }
    }
}

async fn mark_failed(store: &JobStore, id: JobId, err: &JobError) -> anyhow::Result<()> {
    let Some(mut job) = store.get(id).await? else {
        tracing::debug!(job_id = id, "job removed before its failure was recorded: {err}");
        return Ok(());
    };
    if job.status.is_terminal() {
        tracing::debug!(job_id = id, status = %job.status, "not overwriting terminal job: {err}");
        return Ok(());
    }
    let observed = job.status;
    job.status = JobStatus::Failed;
    job.error = Some(err.to_string());
    job.current_speed_bps = None;
    if store.update_if_status(&job, observed).await? {
        tracing::warn!(job_id = id, "job failed: {err}");
    } else {
        tracing::debug!(job_id = id, "job moved on before its failure was recorded: {err}");
    }
    Ok(())
}
