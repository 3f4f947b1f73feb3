//! Job row operations, split into reads and writes.

mod read;
mod write;

/// Column list shared by every full-row SELECT.
const JOB_COLUMNS: &str = "id, filename, source_type, category, status, progress, \
    current_speed_bps, provider_ref, provider_download_url, local_path, error, \
    created_at, updated_at";

pub(crate) use read::row_to_job;
