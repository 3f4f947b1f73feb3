//! `boxfetch run` – run the worker until Ctrl-C.

use anyhow::{Context, Result};
use boxfetch_core::config::BoxfetchConfig;
use boxfetch_core::job_store::JobStore;
use boxfetch_core::provider::TorboxClient;
use boxfetch_core::worker::Worker;
use std::sync::Arc;

pub async fn run_worker(store: JobStore, cfg: BoxfetchConfig) -> Result<()> {
    let worker = Worker::new(store, cfg, Arc::new(TorboxClient::new())).await?;
    let handle = worker.start();
    println!("Worker running; press Ctrl-C to stop.");

    tokio::signal::ctrl_c()
        .await
        .context("listen for Ctrl-C")?;
    println!("Stopping worker...");
    handle.stop().await;
    Ok(())
}
