//! Names of rows in the settings table.

pub const PROVIDER_BASE_URL: &str = "provider_base_url";
pub const PROVIDER_API_KEY: &str = "provider_api_key";
pub const PROVIDER_RATE_LIMIT_PER_MINUTE: &str = "provider_rate_limit_per_minute";
pub const MAX_CONCURRENT_TRANSFERS: &str = "max_concurrent_transfers";
pub const DOWNLOAD_FOLDER: &str = "download_folder";
pub const DELETE_ON_COMPLETE_PROVIDER: &str = "delete_on_complete_provider";
pub const INTAKE_ENABLED: &str = "intake_enabled";
pub const INTAKE_PATH: &str = "intake_path";

/// Every persistent (non per-job) key, in display order.
pub const KNOWN: &[&str] = &[
    PROVIDER_BASE_URL,
    PROVIDER_API_KEY,
    PROVIDER_RATE_LIMIT_PER_MINUTE,
    MAX_CONCURRENT_TRANSFERS,
    DOWNLOAD_FOLDER,
    DELETE_ON_COMPLETE_PROVIDER,
    INTAKE_ENABLED,
    INTAKE_PATH,
    "sonarr_url",
    "sonarr_api_key",
    "radarr_url",
    "radarr_api_key",
    "whisparr_url",
    "whisparr_api_key",
];

/// Keys whose values must parse as a positive integer.
pub const NUMERIC: &[&str] = &[PROVIDER_RATE_LIMIT_PER_MINUTE, MAX_CONCURRENT_TRANSFERS];

/// Keys holding credentials; masked when listed.
pub fn is_secret(key: &str) -> bool {
    key.ends_with("api_key")
}

/// Pointer to the uploaded description file of a job.
pub fn upload_path(id: super::JobId) -> String {
    format!("upload_path:{id}")
}

/// Pointer to the intake source file of a job (after it was moved aside).
pub fn source_path(id: super::JobId) -> String {
    format!("source_path:{id}")
}

/// Scanner base URL key for a category, e.g. `sonarr_url`.
pub fn scanner_url(category: super::Category) -> String {
    format!("{}_url", category.as_str())
}

/// Scanner API key for a category, e.g. `sonarr_api_key`.
pub fn scanner_api_key(category: super::Category) -> String {
    format!("{}_api_key", category.as_str())
}

/// Boolean setting parse: `1`, `true`, `yes`, `on` (any case) are true.
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
