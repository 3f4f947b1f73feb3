//! Local transfer engine: stream a ready artifact to disk, then post-process it.
//!
//! The GET runs on the blocking pool. Before each chunk is written the live job row
//! is re-read through the runtime handle; a vanished or cancelled row aborts the
//! transfer and its partial file is removed. Progress and speed are persisted at
//! most once per `progress_interval`.

mod meter;
mod part_file;
mod stream;
pub mod unpack;

pub use meter::TransferMeter;
pub use part_file::{temp_path, PartFile, PART_SUFFIX};

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::runtime::Handle;

use crate::control::StopToken;
use crate::error::JobError;
use crate::fetch_head::{self, ResponseHead};
use crate::job_store::{Job, JobId, JobStatus, JobStore};
use crate::url_model::{
    parse_content_disposition_filename, prefixed_name, resolve_filename, sanitize_filename,
    NameHints,
};
use stream::ChunkSink;

/// Everything a transfer needs besides the job itself.
#[derive(Debug, Clone)]
pub struct TransferContext {
    pub store: JobStore,
    pub chunk_size: usize,
    pub progress_interval: Duration,
    pub stop: StopToken,
}

/// Output directory for `job` under `output_root`: `<root>[/<category>]`.
pub fn output_dir(output_root: &Path, job: &Job) -> PathBuf {
    match job.category {
        Some(category) => output_root.join(category.as_str()),
        None => output_root.to_path_buf(),
    }
}

/// Downloads `url` for `job` into its output directory and returns the final artifact
/// (the file, or what unpacking produced). Leaves the job `downloading`; the caller
/// records completion.
pub async fn run_transfer(
    ctx: &TransferContext,
    job: &Job,
    url: &str,
    output_root: &Path,
) -> Result<PathBuf, JobError> {
    ensure_downloading(&ctx.store, job.id).await?;

    let dir = output_dir(output_root, job);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| JobError::transfer_io(&format!("create {}", dir.display()), e))?;

    let probed = match fetch_head::probe_async(url.to_string()).await {
        Ok(head) => head,
        Err(e) => {
            tracing::debug!(job_id = job.id, "HEAD probe gave no hints: {e:#}");
            ResponseHead::default()
        }
    };
    let name = resolve_filename(
        url,
        &job.filename,
        NameHints {
            content_disposition: probed.content_disposition.as_deref(),
            content_type: probed.content_type.as_deref(),
        },
    );
    tracing::info!(job_id = job.id, dir = %dir.display(), "transferring as {name}");

    let sink = JobSink {
        handle: Handle::current(),
        store: ctx.store.clone(),
        stop: ctx.stop.clone(),
        job_id: job.id,
        dir,
        name,
        meter: TransferMeter::new(ctx.progress_interval),
        part: None,
    };
    let url = url.to_string();
    let chunk_size = ctx.chunk_size;
    let finished = tokio::task::spawn_blocking(move || {
        let mut sink = sink;
        let bytes = stream::stream_to(&url, chunk_size, &mut sink)?;
        let path = sink.finish()?;
        Ok::<_, JobError>((path, bytes))
    })
    .await
    .map_err(|e| JobError::transfer_io("transfer task", e))?;
    let (path, bytes) = finished?;
    tracing::info!(job_id = job.id, bytes, path = %path.display(), "transfer finished");

    clear_speed(&ctx.store, job.id).await?;

    let artifact = tokio::task::spawn_blocking(move || unpack::unpack_if_archive(&path))
        .await
        .map_err(|e| JobError::transfer_io("unpack task", e))?;
    Ok(artifact)
}

/// The job must still exist and be `downloading`; anything else means it was abandoned.
async fn ensure_downloading(store: &JobStore, id: JobId) -> Result<(), JobError> {
    match store.get(id).await? {
        Some(job) if job.status == JobStatus::Downloading => Ok(()),
        _ => Err(JobError::Cancelled),
    }
}

async fn clear_speed(store: &JobStore, id: JobId) -> Result<(), JobError> {
    if let Some(mut job) = store.get(id).await? {
        if job.status == JobStatus::Downloading {
            job.current_speed_bps = None;
            store.update_if_status(&job, JobStatus::Downloading).await?;
        }
    }
    Ok(())
}

/// Sink that writes chunks to the part file and keeps the job row current.
struct JobSink {
    handle: Handle,
    store: JobStore,
    stop: StopToken,
    job_id: JobId,
    dir: PathBuf,
    name: String,
    meter: TransferMeter,
    part: Option<PartFile>,
}

impl JobSink {
    fn checkpoint(&self) -> Result<(), JobError> {
        if self.stop.is_stopping() {
            return Err(JobError::Interrupted);
        }
        self.handle
            .block_on(ensure_downloading(&self.store, self.job_id))
    }

    fn persist(&self, now: Instant) {
        let speed = self.meter.bytes_per_sec(now);
        let progress = self.meter.progress();
        let result = self.handle.block_on(async {
            let Some(mut job) = self.store.get(self.job_id).await? else {
                return Ok(false);
            };
            if job.status != JobStatus::Downloading {
                return Ok(false);
            }
            job.current_speed_bps = Some(speed);
            if let Some(p) = progress {
                job.progress = job.progress.max(p);
            }
            self.store.update_if_status(&job, JobStatus::Downloading).await
        });
        if let Err(e) = result {
            tracing::warn!(job_id = self.job_id, "could not persist progress: {e:#}");
        }
    }

    fn finish(mut self) -> Result<PathBuf, JobError> {
        let part = self
            .part
            .take()
            .ok_or_else(|| JobError::TransferIo("no response received".into()))?;
        part.finish()
            .map_err(|e| JobError::transfer_io("finalize output", e))
    }
}

impl ChunkSink for JobSink {
    fn on_headers(&mut self, head: &ResponseHead) -> Result<(), JobError> {
        if let Some(served) = head
            .content_disposition
            .as_deref()
            .and_then(parse_content_disposition_filename)
            .map(|n| sanitize_filename(&n))
        {
            if served != self.name {
                tracing::info!(job_id = self.job_id, "server names artifact {served}");
                self.name = served;
            }
        }
        self.meter.set_total(head.content_length);
        let final_path = self.dir.join(prefixed_name(self.job_id, &self.name));
        let part = PartFile::create(final_path)
            .map_err(|e| JobError::transfer_io("create output", e))?;
        self.part = Some(part);
        Ok(())
    }

    fn on_chunk(&mut self, chunk: &[u8]) -> Result<(), JobError> {
        self.checkpoint()?;
        let part = self
            .part
            .as_mut()
            .ok_or_else(|| JobError::TransferIo("body before headers".into()))?;
        part.write_chunk(chunk)
            .map_err(|e| JobError::transfer_io("write output", e))?;
        self.meter.record(chunk.len());

        let now = Instant::now();
        if self.meter.flush_due(now) {
            self.persist(now);
        }
        Ok(())
    }
}
