//! `boxfetch remove <id>` – delete a job and its uploaded files.

use anyhow::{bail, Result};
use boxfetch_core::job_store::JobStore;
use boxfetch_core::manage;

pub async fn run_remove(store: &JobStore, id: i64) -> Result<()> {
    if !manage::remove_job(store, id).await? {
        bail!("no job with id {id}");
    }
    println!("Removed job {id}");
    Ok(())
}
