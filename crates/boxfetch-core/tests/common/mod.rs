//! Shared helpers for integration tests.
#![allow(dead_code)]

pub mod fake_provider;
pub mod http_stub;

use boxfetch_core::config::{BoxfetchConfig, WorkerConfig};
use boxfetch_core::job_store::{keys, Job, JobId, JobStore};
use std::path::Path;
use std::time::{Duration, Instant};

/// Config rooted at `data_dir` with a fast loop, no poll delay and a permissive limiter.
pub fn fast_config(data_dir: &Path) -> BoxfetchConfig {
    let mut cfg = BoxfetchConfig::with_data_dir(data_dir);
    cfg.rate_limit_per_minute = 6000;
    cfg.worker = Some(WorkerConfig {
        idle_interval_ms: 20,
        poll_attempts: 5,
        poll_interval_secs: 0,
        max_poll_errors: 3,
        chunk_size: 16 * 1024,
        progress_interval_ms: 10,
        stop_timeout_secs: 5,
    });
    cfg
}

/// Store in `dir` with a provider key and output folder configured.
pub async fn store_with_key(dir: &Path, download_folder: &Path) -> JobStore {
    let store = JobStore::open_at(dir.join("jobs.db")).await.unwrap();
    store.set_setting(keys::PROVIDER_API_KEY, "test-key").await.unwrap();
    store
        .set_setting(keys::DOWNLOAD_FOLDER, &download_folder.to_string_lossy())
        .await
        .unwrap();
    store
}

/// Polls the store until `done(job)` holds, panicking after `timeout`.
pub async fn wait_for<F>(store: &JobStore, id: JobId, timeout: Duration, done: F) -> Job
where
    F: Fn(&Job) -> bool,
{
    let start = Instant::now();
    loop {
        if let Some(job) = store.get(id).await.unwrap() {
            if done(&job) {
                return job;
            }
            if start.elapsed() > timeout {
                panic!("timed out waiting on job {id}; last seen {job:?}");
            }
        } else if start.elapsed() > timeout {
            panic!("timed out waiting on job {id}; row is gone");
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
}

/// Waits until the job reaches a terminal status.
pub async fn wait_terminal(store: &JobStore, id: JobId) -> Job {
    wait_for(store, id, Duration::from_secs(30), |j| j.status.is_terminal()).await
}
