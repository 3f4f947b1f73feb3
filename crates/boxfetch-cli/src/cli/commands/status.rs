//! `boxfetch status` – show status of all jobs.

use anyhow::Result;
use boxfetch_core::job_store::{Job, JobStore};

pub async fn run_status(store: &JobStore) -> Result<()> {
    let jobs = store.list_jobs().await?;
    if jobs.is_empty() {
        println!("No jobs in database.");
        return Ok(());
    }
    println!(
        "{:<6} {:<12} {:<8} {:<9} {:>5} {:>11}  {}",
        "ID", "STATUS", "KIND", "CATEGORY", "PROG", "SPEED", "FILE"
    );
    for job in &jobs {
        println!(
            "{:<6} {:<12} {:<8} {:<9} {:>4}% {:>11}  {}",
            job.id,
            job.status.as_str(),
            job.source_type.as_str(),
            job.category.map(|c| c.as_str()).unwrap_or("-"),
            job.progress,
            format_speed(job.current_speed_bps),
            detail(job)
        );
    }
    Ok(())
}

/// Filename, followed by the delivered path or the failure reason when there is one.
fn detail(job: &Job) -> String {
    match (&job.local_path, &job.error) {
        (Some(path), _) => format!("{} -> {path}", job.filename),
        (None, Some(err)) => format!("{} ({err})", job.filename),
        (None, None) => job.filename.clone(),
    }
}

fn format_speed(bps: Option<i64>) -> String {
    match bps {
        Some(b) if b >= 1_048_576 => format!("{:.1} MiB/s", b as f64 / 1_048_576.0),
        Some(b) if b >= 1024 => format!("{:.1} KiB/s", b as f64 / 1024.0),
        Some(b) => format!("{b} B/s"),
        None => "-".to_string(),
    }
}
