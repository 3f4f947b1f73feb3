//! Job creation and removal outside the worker (CLI `add`/`remove`, intake).

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::job_store::{keys, Category, JobId, JobStore, NewJob, SourceType};
use crate::url_model::{fit_with_prefix, safe_upload_name};

/// Creates a `queued` job for a description file and stores its bytes under
/// `uploads_dir` as `<id>_<safe_name>`.
pub async fn enqueue(
    store: &JobStore,
    uploads_dir: &Path,
    filename: &str,
    content: &[u8],
    kind: SourceType,
    category: Option<Category>,
) -> Result<JobId> {
    let id = store
        .create(&NewJob {
            filename: filename.to_string(),
            source_type: kind,
            category,
        })
        .await?;

    let upload = uploads_dir.join(fit_with_prefix(id, &safe_upload_name(filename), 0));
    if let Err(e) = write_upload(&upload, content).await {
        // Without its bytes the job could only ever fail.
        if let Err(cleanup) = store.delete(id).await {
            tracing::warn!(job_id = id, "could not drop job after failed upload: {cleanup:#}");
        }
        return Err(e);
    }
    store
        .set_setting(&keys::upload_path(id), &upload.to_string_lossy())
        .await?;

    tracing::info!(job_id = id, kind = kind.as_str(), "queued {filename}");
    Ok(id)
}

async fn write_upload(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("create {}", parent.display()))?;
    }
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("write {}", path.display()))
}

/// Deletes the file behind a per-job pointer setting and the setting itself.
pub(crate) async fn discard_pointer(store: &JobStore, key: &str) -> Result<Option<PathBuf>> {
    let Some(value) = store.get_nonempty_setting(key).await? else {
        store.delete_setting(key).await?;
        return Ok(None);
    };
    let path = PathBuf::from(value);
    match tokio::fs::remove_file(&path).await {
        Ok(()) => tracing::debug!(path = %path.display(), "deleted file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), "could not delete file: {}", e),
    }
    store.delete_setting(key).await?;
    Ok(Some(path))
}

/// Removes a job row together with its uploaded and intake source files.
/// Returns false if no such job existed. Delivered artifacts are left alone.
pub async fn remove_job(store: &JobStore, id: JobId) -> Result<bool> {
    discard_pointer(store, &keys::upload_path(id)).await?;
    discard_pointer(store, &keys::source_path(id)).await?;
    let removed = store.delete(id).await?;
    if removed {
        tracing::info!(job_id = id, "removed job");
    }
    Ok(removed)
}
