//! Types stored in the job database.

/// Job identifier.
pub type JobId = i64;

/// Lifecycle state stored as a string in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Queued,
    Submitting,
    Submitted,
    Downloading,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub const ALL: [JobStatus; 7] = [
        JobStatus::Queued,
        JobStatus::Submitting,
        JobStatus::Submitted,
        JobStatus::Downloading,
        JobStatus::Completed,
        JobStatus::Failed,
        JobStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Submitting => "submitting",
            JobStatus::Submitted => "submitted",
            JobStatus::Downloading => "downloading",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    /// Unknown strings read back as `Failed` so a corrupt row never re-enters processing.
    pub fn from_str(s: &str) -> Self {
        match s {
            "queued" => JobStatus::Queued,
            "submitting" => JobStatus::Submitting,
            "submitted" => JobStatus::Submitted,
            "downloading" => JobStatus::Downloading,
            "completed" => JobStatus::Completed,
            "cancelled" => JobStatus::Cancelled,
            _ => JobStatus::Failed,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }

    /// Allowed lifecycle edges. Any non-terminal state may fail or be cancelled;
    /// forward progress is strictly queued → submitting → submitted → downloading → completed.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, next),
            (JobStatus::Queued, JobStatus::Submitting)
                | (JobStatus::Submitting, JobStatus::Submitted)
                | (JobStatus::Submitted, JobStatus::Downloading)
                | (JobStatus::Downloading, JobStatus::Completed)
                | (_, JobStatus::Failed)
                | (_, JobStatus::Cancelled)
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the job asks the provider to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceType {
    Torrent,
    Nzb,
}

impl SourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceType::Torrent => "torrent",
            SourceType::Nzb => "nzb",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "torrent" => Some(SourceType::Torrent),
            "nzb" | "usenet" => Some(SourceType::Nzb),
            _ => None,
        }
    }

    /// Kind implied by a file extension (`torrent` / `nzb`, any case, no dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        if ext.eq_ignore_ascii_case("torrent") {
            Some(SourceType::Torrent)
        } else if ext.eq_ignore_ascii_case("nzb") {
            Some(SourceType::Nzb)
        } else {
            None
        }
    }

    /// Kind implied by a file name's extension.
    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// Downstream library a job belongs to; also the output subfolder name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Radarr,
    Sonarr,
    Whisparr,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Radarr, Category::Sonarr, Category::Whisparr];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Radarr => "radarr",
            Category::Sonarr => "sonarr",
            Category::Whisparr => "whisparr",
        }
    }

    /// Case-insensitive match on the category name.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields supplied when a job is created; everything else starts empty.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub filename: String,
    pub source_type: SourceType,
    pub category: Option<Category>,
}

/// Full job row.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: JobId,
    pub filename: String,
    pub source_type: SourceType,
    pub category: Option<Category>,
    pub status: JobStatus,
    /// 0..=100.
    pub progress: u8,
    pub current_speed_bps: Option<i64>,
    pub provider_ref: Option<String>,
    pub provider_download_url: Option<String>,
    pub local_path: Option<String>,
    pub error: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}
