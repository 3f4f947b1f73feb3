//! `boxfetch add <file>` – queue a description file.

use anyhow::{Context, Result};
use boxfetch_core::config::BoxfetchConfig;
use boxfetch_core::job_store::{Category, JobStore, SourceType};
use boxfetch_core::manage;
use std::path::Path;

pub async fn run_add(
    store: &JobStore,
    cfg: &BoxfetchConfig,
    path: &Path,
    kind: Option<SourceType>,
    category: Option<Category>,
) -> Result<()> {
    let kind = kind
        .or_else(|| SourceType::from_path(path))
        .with_context(|| {
            format!(
                "cannot tell whether {} is a torrent or an nzb; pass --kind",
                path.display()
            )
        })?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", path.display()))?;
    let content = tokio::fs::read(path)
        .await
        .with_context(|| format!("read {}", path.display()))?;

    let id = manage::enqueue(store, &cfg.uploads_dir(), &filename, &content, kind, category).await?;
    println!("Added job {id} ({}) for {filename}", kind.as_str());
    Ok(())
}
