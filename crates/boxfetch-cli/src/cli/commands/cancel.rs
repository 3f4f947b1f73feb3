//! `boxfetch cancel <id>` – cancel a job that has not finished.

use anyhow::{bail, Result};
use boxfetch_core::job_store::JobStore;

pub async fn run_cancel(store: &JobStore, id: i64) -> Result<()> {
    if store.cancel(id).await? {
        println!("Cancelled job {id}");
        return Ok(());
    }
    match store.get(id).await? {
        Some(job) => bail!("job {id} is already {}", job.status),
        None => bail!("no job with id {id}"),
    }
}
