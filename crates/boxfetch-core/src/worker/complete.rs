//! Completion: record the artifact, notify scanners, clean up.

use std::path::Path;

use super::best_effort::attempt;
use super::transition::transition;
use super::{ResolvedSettings, Shared};
use crate::error::JobError;
use crate::job_store::{keys, Job, JobStatus};
use crate::manage;
use crate::notify;
use crate::provider::ControlAction;

pub(super) async fn finish(shared: &Shared, job: &Job, artifact: &Path) -> Result<(), JobError> {
    let done = transition(&shared.store, job, JobStatus::Completed, |j| {
        j.progress = 100;
        j.local_path = Some(artifact.to_string_lossy().into_owned());
        j.current_speed_bps = None;
        j.error = None;
    })
    .await?;
    tracing::info!(job_id = done.id, path = %artifact.display(), "job completed");

    // Everything past this point is best-effort: the job is already delivered.
    let Some(resolved) = attempt(
        done.id,
        "load settings for cleanup",
        ResolvedSettings::load(&shared.store, &shared.cfg),
    )
    .await
    else {
        return Ok(());
    };

    for scanner in &resolved.scanners {
        let what = format!("{} notification", scanner.category);
        attempt(done.id, &what, notify::notify(scanner, artifact)).await;
    }
    cleanup(shared, &done, &resolved).await;
    Ok(())
}

async fn cleanup(shared: &Shared, job: &Job, resolved: &ResolvedSettings) {
    attempt(
        job.id,
        "upload cleanup",
        manage::discard_pointer(&shared.store, &keys::upload_path(job.id)),
    )
    .await;
    attempt(
        job.id,
        "intake source cleanup",
        manage::discard_pointer(&shared.store, &keys::source_path(job.id)),
    )
    .await;

    if !resolved.delete_on_complete_provider {
        return;
    }
    let (Some(auth), Some(reference)) = (resolved.auth(), job.provider_ref.as_deref()) else {
        tracing::debug!(job_id = job.id, "no credentials or reference; skipping provider delete");
        return;
    };
    let deleted = attempt(
        job.id,
        "provider delete",
        shared.limiter.run(shared.provider.control(
            auth,
            reference,
            job.source_type,
            ControlAction::Delete,
        )),
    )
    .await;
    if deleted.is_some() {
        tracing::info!(job_id = job.id, reference, "removed job from provider");
    }
}
