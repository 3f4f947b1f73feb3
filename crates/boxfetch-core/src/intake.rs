//! Watch-folder intake: `.torrent`/`.nzb` files dropped under the intake root become
//! queued jobs; handled files are moved into `<root>/_processed/`. Every candidate
//! leaves the walk after one pass, whether or not it could be read.

use anyhow::{Context, Result};
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::job_store::db::unix_timestamp;
use crate::job_store::{keys, Category, JobId, JobStore, SourceType};
use crate::manage;
use crate::url_model::fit_with_prefix;

/// Subdirectory of the intake root holding handled files; never scanned.
pub const PROCESSED_DIR: &str = "_processed";

/// Under `_processed`: files that could not be read.
pub const UNREADABLE_DIR: &str = "unreadable";

/// A description file found by the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    pub kind: SourceType,
    pub category: Option<Category>,
}

/// Lists intake candidates under `root`, in walk order.
pub fn discover(root: &Path) -> Vec<Candidate> {
    WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !(e.depth() == 1 && e.file_type().is_dir() && e.file_name() == PROCESSED_DIR))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!("intake walk: {e}");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .filter(|e| !e.file_name().to_string_lossy().starts_with('.'))
        .filter_map(|e| {
            let kind = SourceType::from_path(e.path())?;
            Some(Candidate {
                category: category_for(root, e.path()),
                path: e.into_path(),
                kind,
            })
        })
        .collect()
}

/// First directory between `root` and `file` named after a category.
pub fn category_for(root: &Path, file: &Path) -> Option<Category> {
    let relative = file.strip_prefix(root).ok()?;
    let parent = relative.parent()?;
    parent
        .components()
        .filter_map(|c| c.as_os_str().to_str())
        .find_map(Category::parse)
}

/// One pass over `root`: enqueue every candidate and move it aside.
/// Returns the ids of the jobs created. A missing root is not an error.
pub async fn scan(store: &JobStore, root: &Path, uploads_dir: &Path) -> Result<Vec<JobId>> {
    if !tokio::fs::metadata(root).await.is_ok_and(|m| m.is_dir()) {
        tracing::debug!(root = %root.display(), "intake folder missing; skipping");
        return Ok(Vec::new());
    }
    let walk_root = root.to_path_buf();
    let candidates = tokio::task::spawn_blocking(move || discover(&walk_root))
        .await
        .context("intake walk task")?;

    let mut created = Vec::new();
    for candidate in &candidates {
        if let Some(id) = take(store, root, uploads_dir, candidate).await? {
            created.push(id);
        }
    }
    if !created.is_empty() {
        tracing::info!(root = %root.display(), count = created.len(), "intake queued jobs");
    }
    Ok(created)
}

/// Enqueues one candidate and moves it out of the walk. A file that can't be read
/// is moved to `_processed/unreadable/` (or deleted) without creating a job.
async fn take(
    store: &JobStore,
    root: &Path,
    uploads_dir: &Path,
    candidate: &Candidate,
) -> Result<Option<JobId>> {
    let filename = candidate
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let content = match tokio::fs::read(&candidate.path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(path = %candidate.path.display(), "unreadable intake file, setting it aside: {e}");
            let dir = root.join(PROCESSED_DIR).join(UNREADABLE_DIR);
            if let Err(e) = move_into(&dir, &candidate.path, &filename, unix_timestamp()).await {
                tracing::warn!(path = %candidate.path.display(), "could not move unreadable file ({e}); deleting it");
                discard(&candidate.path).await;
            }
            return Ok(None);
        }
    };

    let id = manage::enqueue(
        store,
        uploads_dir,
        &filename,
        &content,
        candidate.kind,
        candidate.category,
    )
    .await?;
    match move_into(&root.join(PROCESSED_DIR), &candidate.path, &filename, id).await {
        Ok(target) => {
            store
                .set_setting(&keys::source_path(id), &target.to_string_lossy())
                .await?;
        }
        Err(e) => {
            tracing::warn!(job_id = id, path = %candidate.path.display(), "could not move intake file ({e}); deleting it");
            discard(&candidate.path).await;
        }
    }
    Ok(Some(id))
}

/// Moves `source` into `dir` as `filename`, or `<tag>_<filename>` when that is taken.
async fn move_into(
    dir: &Path,
    source: &Path,
    filename: &str,
    tag: impl std::fmt::Display,
) -> io::Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let mut target = dir.join(filename);
    if tokio::fs::try_exists(&target).await.unwrap_or(false) {
        target = dir.join(fit_with_prefix(tag, filename, 0));
    }
    tokio::fs::rename(source, &target).await?;
    Ok(target)
}

async fn discard(source: &Path) {
    if let Err(e) = tokio::fs::remove_file(source).await {
        tracing::warn!(path = %source.display(), "could not delete intake file: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job_store::db::open_memory;
    use crate::job_store::JobStatus;
    use std::fs;

    #[test]
    fn category_from_ancestors_only() {
        let root = Path::new("/intake");
        assert_eq!(
            category_for(root, Path::new("/intake/Sonarr/show.torrent")),
            Some(Category::Sonarr)
        );
        assert_eq!(
            category_for(root, Path::new("/intake/new/radarr/film.nzb")),
            Some(Category::Radarr)
        );
        assert_eq!(category_for(root, Path::new("/intake/radarr.torrent")), None);
        assert_eq!(category_for(root, Path::new("/intake/misc/x.torrent")), None);
    }

    #[test]
    fn discover_filters_and_skips_processed() {
        let root = tempfile::tempdir().unwrap();
        let r = root.path();
        fs::create_dir_all(r.join("whisparr/deep")).unwrap();
        fs::create_dir_all(r.join(PROCESSED_DIR)).unwrap();
        fs::write(r.join("a.TORRENT"), b"t").unwrap();
        fs::write(r.join("whisparr/deep/b.nzb"), b"n").unwrap();
        fs::write(r.join(".hidden.torrent"), b"t").unwrap();
        fs::write(r.join("notes.txt"), b"x").unwrap();
        fs::write(r.join(PROCESSED_DIR).join("old.torrent"), b"t").unwrap();

        let found = discover(r);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].path, r.join("a.TORRENT"));
        assert_eq!(found[0].kind, SourceType::Torrent);
        assert_eq!(found[0].category, None);
        assert_eq!(found[1].kind, SourceType::Nzb);
        assert_eq!(found[1].category, Some(Category::Whisparr));
    }

    #[tokio::test]
    async fn scan_enqueues_and_moves_aside() {
        let store = open_memory().await.unwrap();
        let root = tempfile::tempdir().unwrap();
        let uploads = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("radarr")).unwrap();
        let source = root.path().join("radarr/Film (2020).nzb");
        fs::write(&source, b"<nzb/>").unwrap();

        let ids = scan(&store, root.path(), uploads.path()).await.unwrap();
        assert_eq!(ids.len(), 1);
        let job = store.get(ids[0]).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.source_type, SourceType::Nzb);
        assert_eq!(job.category, Some(Category::Radarr));
        assert_eq!(job.filename, "Film (2020).nzb");

        assert!(!source.exists());
        let moved = root.path().join(PROCESSED_DIR).join("Film (2020).nzb");
        assert!(moved.exists());
        assert_eq!(
            store.get_setting(&keys::source_path(ids[0])).await.unwrap(),
            Some(moved.to_string_lossy().into_owned())
        );

        // Nothing left to pick up.
        assert!(scan(&store, root.path(), uploads.path()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unreadable_candidate_is_set_aside_once() {
        let store = open_memory().await.unwrap();
        let root = tempfile::tempdir().unwrap();
        let uploads = tempfile::tempdir().unwrap();
        // A directory with a candidate's name fails to read like a file would.
        let source = root.path().join("sonarr/broken.torrent");
        fs::create_dir_all(&source).unwrap();
        let candidate = Candidate {
            path: source.clone(),
            kind: SourceType::Torrent,
            category: Some(Category::Sonarr),
        };

        let taken = take(&store, root.path(), uploads.path(), &candidate).await.unwrap();
        assert_eq!(taken, None);
        assert!(!source.exists());
        assert!(root
            .path()
            .join(PROCESSED_DIR)
            .join(UNREADABLE_DIR)
            .join("broken.torrent")
            .exists());
        assert!(store.list_jobs().await.unwrap().is_empty());

        // Later passes never see it again.
        assert!(discover(root.path()).is_empty());
        assert!(scan(&store, root.path(), uploads.path()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn name_collision_in_processed_gets_id_prefix() {
        let store = open_memory().await.unwrap();
        let root = tempfile::tempdir().unwrap();
        let uploads = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join(PROCESSED_DIR)).unwrap();
        fs::write(root.path().join(PROCESSED_DIR).join("ep.nzb"), b"old").unwrap();
        fs::write(root.path().join("ep.nzb"), b"new").unwrap();

        let ids = scan(&store, root.path(), uploads.path()).await.unwrap();
        assert_eq!(ids.len(), 1);
        let moved = root.path().join(PROCESSED_DIR).join(format!("{}_ep.nzb", ids[0]));
        assert_eq!(fs::read(moved).unwrap(), b"new");
    }

    #[tokio::test]
    async fn missing_root_is_a_no_op() {
        let store = open_memory().await.unwrap();
        let uploads = tempfile::tempdir().unwrap();
        let ids = scan(&store, Path::new("/nonexistent/intake"), uploads.path())
            .await
            .unwrap();
        assert!(ids.is_empty());
    }
}
