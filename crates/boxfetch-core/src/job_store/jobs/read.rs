//! Job read operations: get, query, list.

use anyhow::{anyhow, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::super::db::JobStore;
use super::super::types::{Category, Job, JobId, JobStatus, SourceType};
use super::JOB_COLUMNS;

/// Map a full-row SELECT onto `Job`.
pub(crate) fn row_to_job(row: &SqliteRow) -> Result<Job> {
    let id: i64 = row.get("id");
    let source_type: String = row.get("source_type");
    let source_type = SourceType::parse(&source_type)
        .ok_or_else(|| anyhow!("job {id}: unknown source_type {source_type:?}"))?;
    let category: Option<String> = row.get("category");
    let status: String = row.get("status");
    let progress: i64 = row.get("progress");

    Ok(Job {
        id,
        filename: row.get("filename"),
        source_type,
        category: category.as_deref().and_then(Category::parse),
        status: JobStatus::from_str(&status),
        progress: progress.clamp(0, 100) as u8,
        current_speed_bps: row.get("current_speed_bps"),
        provider_ref: row.get("provider_ref"),
        provider_download_url: row.get("provider_download_url"),
        local_path: row.get("local_path"),
        error: row.get("error"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

impl JobStore {
    /// Fetch a single job row.
    pub async fn get(&self, id: JobId) -> Result<Option<Job>> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_job).transpose()
    }

    /// Jobs whose status is one of `statuses`, oldest (lowest id) first.
    /// An empty slice matches every job.
    pub async fn query(&self, statuses: &[JobStatus]) -> Result<Vec<Job>> {
        let sql = if statuses.is_empty() {
            format!("SELECT {JOB_COLUMNS} FROM jobs ORDER BY id ASC")
        } else {
            let placeholders = vec!["?"; statuses.len()].join(", ");
            format!(
                "SELECT {JOB_COLUMNS} FROM jobs WHERE status IN ({placeholders}) ORDER BY id ASC"
            )
        };
        let mut query = sqlx::query(&sql);
        for status in statuses {
            query = query.bind(status.as_str());
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(row_to_job).collect()
    }

    /// All jobs, newest first (for `status` listings).
    pub async fn list_jobs(&self) -> Result<Vec<Job>> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM jobs ORDER BY id DESC");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_job).collect()
    }

    /// Transfers interrupted by a crash or stop: `downloading` rows that already have a URL.
    /// Stranded `submitting` rows need no recovery here; `claim_next` picks them up.
    pub async fn recover_stranded(&self) -> Result<Vec<Job>> {
        let jobs = self.query(&[JobStatus::Downloading]).await?;
        Ok(jobs
            .into_iter()
            .filter(|j| j.provider_download_url.is_some())
            .collect())
    }
}
