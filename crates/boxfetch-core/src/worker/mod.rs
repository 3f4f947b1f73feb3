//! Job lifecycle worker.
//!
//! One loop task claims the oldest eligible job each tick and drives it through
//! submission and readiness polling. Ready jobs are handed to transfer tasks tracked
//! in a `JoinSet` and bounded by the `TransferGate`; those tasks also record
//! completion, notify scanners and clean up.
//!
//! ```text
//! queued -> submitting -> submitted -> downloading -> completed
//!        (any non-terminal) -> failed | cancelled
//! ```

pub(crate) mod best_effort;
mod complete;
mod poll;
pub mod settings;
mod submit;
mod transition;

pub use settings::ResolvedSettings;

use anyhow::Result;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::{JoinHandle, JoinSet};

use crate::config::{BoxfetchConfig, WorkerConfig};
use crate::control::StopToken;
use crate::error::JobError;
use crate::intake;
use crate::job_store::{keys, Job, JobId, JobStatus, JobStore};
use crate::provider::Provider;
use crate::rate_limit::ProviderRateLimiter;
use crate::transfer::{self, TransferContext};
use crate::transfer_gate::TransferGate;

/// State shared by the loop and its transfer tasks.
pub(crate) struct Shared {
    pub(crate) store: JobStore,
    pub(crate) cfg: BoxfetchConfig,
    pub(crate) tuning: WorkerConfig,
    pub(crate) provider: Arc<dyn Provider>,
    pub(crate) limiter: ProviderRateLimiter,
    pub(crate) gate: TransferGate,
    pub(crate) stop: StopToken,
}

/// A configured, not yet started worker.
pub struct Worker {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("limiter", &self.shared.limiter)
            .field("gate", &self.shared.gate)
            .finish_non_exhaustive()
    }
}

impl Worker {
    /// Builds a worker; the rate limit and transfer concurrency come from the settings
    /// table when set there, else from `cfg`.
    pub async fn new(
        store: JobStore,
        cfg: BoxfetchConfig,
        provider: Arc<dyn Provider>,
    ) -> Result<Self> {
        let per_minute = settings::numeric_override(
            &store,
            keys::PROVIDER_RATE_LIMIT_PER_MINUTE,
            u64::from(cfg.rate_limit_per_minute),
        )
        .await?;
        let transfers = settings::numeric_override(
            &store,
            keys::MAX_CONCURRENT_TRANSFERS,
            cfg.max_concurrent_transfers as u64,
        )
        .await?;
        tracing::info!(per_minute, transfers, "worker configured");

        Ok(Self {
            shared: Arc::new(Shared {
                tuning: cfg.worker(),
                limiter: ProviderRateLimiter::per_minute(
                    u32::try_from(per_minute).unwrap_or(u32::MAX),
                ),
                gate: TransferGate::new(usize::try_from(transfers).unwrap_or(usize::MAX)),
                stop: StopToken::new(),
                store,
                cfg,
                provider,
            }),
        })
    }

    /// Spawns the loop on the current runtime.
    pub fn start(self) -> WorkerHandle {
        let stop = self.shared.stop.clone();
        let stop_timeout = self.shared.tuning.stop_timeout();
        let join = tokio::spawn(run_loop(self.shared));
        WorkerHandle {
            stop,
            stop_timeout,
            join,
        }
    }
}

/// A running worker.
#[derive(Debug)]
pub struct WorkerHandle {
    stop: StopToken,
    stop_timeout: std::time::Duration,
    join: JoinHandle<()>,
}

impl WorkerHandle {
    pub fn is_running(&self) -> bool {
        !self.join.is_finished()
    }

    /// Signals the loop and waits for it, then for in-flight transfers, each bounded by
    /// the stop timeout. Whatever is still running afterwards is aborted.
    pub async fn stop(mut self) {
        self.stop.stop();
        // Loop drain plus transfer drain.
        let bound = self.stop_timeout * 2;
        match tokio::time::timeout(bound, &mut self.join).await {
            Ok(Ok(())) => tracing::info!("worker stopped"),
            Ok(Err(e)) => tracing::warn!("worker task ended abnormally: {e}"),
            Err(_) => {
                tracing::warn!("worker did not stop within {:?}; aborting", bound);
                self.join.abort();
            }
        }
    }
}

async fn run_loop(shared: Arc<Shared>) {
    tracing::info!("worker started");
    let mut transfers = JoinSet::new();
    if let Err(e) = resume_stranded(&shared, &mut transfers).await {
        tracing::warn!("could not resume interrupted transfers: {e:#}");
    }

    let idle = shared.tuning.idle_interval();
    while !shared.stop.is_stopping() {
        if let Err(e) = tick(&shared, &mut transfers).await {
            tracing::warn!("worker tick failed: {e:#}");
        }
        while let Some(done) = transfers.try_join_next() {
            if let Err(e) = done {
                tracing::warn!("transfer task ended abnormally: {e}");
            }
        }
        if !shared.stop.sleep(idle).await {
            break;
        }
    }

    let drain = async { while transfers.join_next().await.is_some() {} };
    if tokio::time::timeout(shared.tuning.stop_timeout(), drain).await.is_err() {
        tracing::warn!(remaining = transfers.len(), "aborting unfinished transfers");
        transfers.abort_all();
    }
}

/// Hands `downloading` rows left by a previous run back to the transfer engine.
async fn resume_stranded(shared: &Arc<Shared>, transfers: &mut JoinSet<()>) -> Result<()> {
    let stranded = shared.store.recover_stranded().await?;
    if stranded.is_empty() {
        return Ok(());
    }
    let resolved = ResolvedSettings::load(&shared.store, &shared.cfg).await?;
    for job in stranded {
        tracing::info!(job_id = job.id, "restarting interrupted transfer");
        spawn_transfer(shared, transfers, job, resolved.output_root.clone());
    }
    Ok(())
}

/// One scheduler step: intake pass, then advance the oldest eligible job.
async fn tick(shared: &Arc<Shared>, transfers: &mut JoinSet<()>) -> Result<()> {
    let resolved = ResolvedSettings::load(&shared.store, &shared.cfg).await?;
    if let Some(root) = &resolved.intake {
        if let Err(e) = intake::scan(&shared.store, root, &shared.cfg.uploads_dir()).await {
            tracing::warn!(root = %root.display(), "intake scan failed: {e:#}");
        }
    }

    let Some(job) = shared.store.claim_next().await? else {
        return Ok(());
    };
    let id = job.id;
    tracing::debug!(job_id = id, status = %job.status, "claimed job");
    match advance(shared, job, &resolved).await {
        Ok(Some(ready)) => spawn_transfer(shared, transfers, ready, resolved.output_root.clone()),
        Ok(None) => {}
        Err(e) => transition::record_failure(&shared.store, id, e).await,
    }
    Ok(())
}

/// Submission then polling. `Some` once the job reached `downloading`.
async fn advance(
    shared: &Shared,
    job: Job,
    resolved: &ResolvedSettings,
) -> Result<Option<Job>, JobError> {
    let job = submit::ensure_submitted(shared, job, resolved).await?;
    poll::poll_until_ready(shared, job, resolved).await
}

/// Waits for a provider slot, then runs `call` only if job `id` is still `expected`.
///
/// The outer error means the job moved on (cancelled, removed) while waiting; the
/// inner result is the provider's.
pub(crate) async fn limited_call<T, E>(
    shared: &Shared,
    id: JobId,
    expected: JobStatus,
    call: impl Future<Output = Result<T, E>>,
) -> Result<Result<T, E>, JobError> {
    shared.limiter.acquire().await;
    match shared.store.get(id).await? {
        Some(job) if job.status == expected => Ok(call.await),
        _ => {
            tracing::info!(job_id = id, "job changed while waiting for a provider slot");
            Err(JobError::Cancelled)
        }
    }
}

fn spawn_transfer(
    shared: &Arc<Shared>,
    transfers: &mut JoinSet<()>,
    job: Job,
    output_root: PathBuf,
) {
    let shared = Arc::clone(shared);
    transfers.spawn(async move {
        let id = job.id;
        if let Err(e) = transfer_and_complete(&shared, job, output_root).await {
            transition::record_failure(&shared.store, id, e).await;
        }
    });
}

async fn transfer_and_complete(
    shared: &Shared,
    job: Job,
    output_root: PathBuf,
) -> Result<(), JobError> {
    let url = job
        .provider_download_url
        .clone()
        .ok_or_else(|| JobError::TransferIo("no download URL recorded".into()))?;
    let ctx = TransferContext {
        store: shared.store.clone(),
        chunk_size: shared.tuning.chunk_size.max(1),
        progress_interval: shared.tuning.progress_interval(),
        stop: shared.stop.clone(),
    };

    let slot = shared.gate.acquire().await?;
    if shared.stop.is_stopping() {
        return Err(JobError::Interrupted);
    }
    tracing::debug!(job_id = job.id, active = shared.gate.active(), "transfer slot acquired");
    let artifact = transfer::run_transfer(&ctx, &job, &url, &output_root).await;
    drop(slot);

    let artifact = artifact?;
    complete::finish(shared, &job, &artifact).await
}
