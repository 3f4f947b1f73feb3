//! Job write operations: create, claim, update, cancel, delete.

use anyhow::Result;
use sqlx::Row;

use super::super::db::{unix_timestamp, JobStore};
use super::super::types::{Job, JobId, JobStatus, NewJob};
use super::{row_to_job, JOB_COLUMNS};

impl JobStore {
    /// Insert a new `queued` job and return its id.
    pub async fn create(&self, job: &NewJob) -> Result<JobId> {
        let now = unix_timestamp();
        let id = sqlx::query(
            r#"
            INSERT INTO jobs (filename, source_type, category, status, progress, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6)
            "#,
        )
        .bind(&job.filename)
        .bind(job.source_type.as_str())
        .bind(job.category.map(|c| c.as_str()))
        .bind(JobStatus::Queued.as_str())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();
        Ok(id)
    }

    /// Atomically claim the lowest-id job eligible for the submit/poll phases.
    ///
    /// Eligible rows are `queued`, `submitted`, and `submitting` rows stranded by a
    /// crash. A `queued` row is flipped to `submitting` inside the same transaction,
    /// so it is never handed out twice.
    pub async fn claim_next(&self) -> Result<Option<Job>> {
        let now = unix_timestamp();
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(
            r#"
            SELECT id, status FROM jobs
            WHERE status IN ('queued', 'submitting', 'submitted')
            ORDER BY id ASC
            LIMIT 1
            "#,
        )
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = row else {
            tx.commit().await?;
            return Ok(None);
        };
        let id: i64 = row.get("id");
        let status: String = row.get("status");
        if JobStatus::from_str(&status) == JobStatus::Queued {
            sqlx::query(
                r#"
                UPDATE jobs
                SET status = 'submitting',
                    updated_at = ?1
                WHERE id = ?2 AND status = 'queued'
                "#,
            )
            .bind(now)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }
        let sql = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?1");
        let row = sqlx::query(&sql).bind(id).fetch_one(&mut *tx).await?;
        tx.commit().await?;
        Ok(Some(row_to_job(&row)?))
    }

    /// Full-row upsert. Immutable columns (`filename`, `source_type`, `category`,
    /// `created_at`) are only written when the row is inserted.
    pub async fn update(&self, job: &Job) -> Result<()> {
        let now = unix_timestamp();
        sqlx::query(
            r#"
            INSERT INTO jobs (
                id, filename, source_type, category, status, progress, current_speed_bps,
                provider_ref, provider_download_url, local_path, error, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            ON CONFLICT(id) DO UPDATE SET
                status = excluded.status,
                progress = excluded.progress,
                current_speed_bps = excluded.current_speed_bps,
                provider_ref = excluded.provider_ref,
                provider_download_url = excluded.provider_download_url,
                local_path = excluded.local_path,
                error = excluded.error,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(job.id)
        .bind(&job.filename)
        .bind(job.source_type.as_str())
        .bind(job.category.map(|c| c.as_str()))
        .bind(job.status.as_str())
        .bind(i64::from(job.progress))
        .bind(job.current_speed_bps)
        .bind(&job.provider_ref)
        .bind(&job.provider_download_url)
        .bind(&job.local_path)
        .bind(&job.error)
        .bind(job.created_at)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Write the mutable columns of `job` only if the row still exists and still holds
    /// `observed` status. Returns false when the row vanished or moved on (e.g. was cancelled).
    ///
    /// `provider_ref` is never overwritten once set and `progress` never decreases.
    pub async fn update_if_status(&self, job: &Job, observed: JobStatus) -> Result<bool> {
        let now = unix_timestamp();
        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET status = ?1,
                progress = MAX(progress, ?2),
                current_speed_bps = ?3,
                provider_ref = COALESCE(provider_ref, ?4),
                provider_download_url = ?5,
                local_path = ?6,
                error = ?7,
                updated_at = ?8
            WHERE id = ?9 AND status = ?10
            "#,
        )
        .bind(job.status.as_str())
        .bind(i64::from(job.progress))
        .bind(job.current_speed_bps)
        .bind(&job.provider_ref)
        .bind(&job.provider_download_url)
        .bind(&job.local_path)
        .bind(&job.error)
        .bind(now)
        .bind(job.id)
        .bind(observed.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Request cancellation: any non-terminal job becomes `cancelled`.
    /// Returns false if the job is missing or already terminal.
    pub async fn cancel(&self, id: JobId) -> Result<bool> {
        let now = unix_timestamp();
        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'cancelled',
                current_speed_bps = NULL,
                updated_at = ?1
            WHERE id = ?2 AND status NOT IN ('completed', 'failed', 'cancelled')
            "#,
        )
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Remove a job row. Returns false if it did not exist.
    pub async fn delete(&self, id: JobId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}
