use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides `provider_api_key` from the file.
pub const API_KEY_ENV: &str = "BOXFETCH_PROVIDER_API_KEY";

/// Worker loop tuning (optional `[worker]` section in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Sleep between scheduler ticks, in milliseconds.
    pub idle_interval_ms: u64,
    /// Maximum readiness polls per claim before the job is left for a later tick.
    pub poll_attempts: u32,
    /// Delay between readiness polls, in seconds.
    pub poll_interval_secs: u64,
    /// Consecutive failed polls that fail the job.
    pub max_poll_errors: u32,
    /// Bytes buffered per written chunk; the cancellation check runs once per chunk.
    pub chunk_size: usize,
    /// Minimum spacing between progress/speed writes during a transfer.
    pub progress_interval_ms: u64,
    /// Upper bound on how long `stop()` waits for the loop and for in-flight transfers.
    pub stop_timeout_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            idle_interval_ms: 500,
            poll_attempts: 60,
            poll_interval_secs: 2,
            max_poll_errors: 5,
            chunk_size: 256 * 1024,
            progress_interval_ms: 500,
            stop_timeout_secs: 5,
        }
    }
}

impl WorkerConfig {
    pub fn idle_interval(&self) -> Duration {
        Duration::from_millis(self.idle_interval_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }
}

/// Global configuration loaded from `~/.config/boxfetch/config.toml`.
///
/// Values stored in the settings table (see `job_store::keys`) take precedence
/// over the provider, limit and folder values here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoxfetchConfig {
    /// Root for uploads and other worker-owned files.
    pub data_dir: PathBuf,
    /// Default output root for finished transfers.
    pub download_dir: PathBuf,
    /// Provider API base URL (without the `/v1/api` suffix).
    pub provider_base_url: String,
    /// Provider API key; `BOXFETCH_PROVIDER_API_KEY` overrides it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_api_key: Option<String>,
    /// Provider calls allowed per rolling 60 s window.
    pub rate_limit_per_minute: u32,
    /// Simultaneous local transfers.
    pub max_concurrent_transfers: usize,
    #[serde(default)]
    pub worker: Option<WorkerConfig>,
}

impl Default for BoxfetchConfig {
    fn default() -> Self {
        Self::with_data_dir("/data")
    }
}

impl BoxfetchConfig {
    /// Defaults rooted at `data_dir`, with downloads in `<data_dir>/downloads`.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            download_dir: data_dir.join("downloads"),
            data_dir,
            provider_base_url: "https://api.torbox.app".to_string(),
            provider_api_key: None,
            rate_limit_per_minute: 10,
            max_concurrent_transfers: 2,
            worker: None,
        }
    }

    /// Worker tuning, falling back to built-in defaults when the section is absent.
    pub fn worker(&self) -> WorkerConfig {
        self.worker.clone().unwrap_or_default()
    }

    /// Directory holding the uploaded job description files.
    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }

    /// Applies environment overrides using `lookup` (e.g. `std::env::var`).
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.provider_api_key = Some(key.trim().to_string());
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("boxfetch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<BoxfetchConfig> {
    let path = config_path()?;
    let xdg_dirs = xdg::BaseDirectories::with_prefix("boxfetch")?;
    let mut cfg = load_or_init_at(&path, &xdg_dirs.get_data_home())?;
    cfg.apply_env(|name| std::env::var(name).ok());
    Ok(cfg)
}

/// Like `load_or_init` for an explicit path; a new file gets defaults rooted at `data_home`.
pub fn load_or_init_at(path: &Path, data_home: &Path) -> Result<BoxfetchConfig> {
    if !path.exists() {
        let default_cfg = BoxfetchConfig::with_data_dir(data_home);
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path)?;
    let cfg: BoxfetchConfig =
        toml::from_str(&data).with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = BoxfetchConfig::default();
        assert_eq!(cfg.data_dir, PathBuf::from("/data"));
        assert_eq!(cfg.download_dir, PathBuf::from("/data/downloads"));
        assert_eq!(cfg.provider_base_url, "https://api.torbox.app");
        assert_eq!(cfg.rate_limit_per_minute, 10);
        assert_eq!(cfg.max_concurrent_transfers, 2);
        assert_eq!(cfg.uploads_dir(), PathBuf::from("/data/uploads"));
        assert_eq!(cfg.worker(), WorkerConfig::default());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = BoxfetchConfig::with_data_dir("/srv/boxfetch");
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: BoxfetchConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.data_dir, cfg.data_dir);
        assert_eq!(parsed.download_dir, PathBuf::from("/srv/boxfetch/downloads"));
        assert_eq!(parsed.rate_limit_per_minute, cfg.rate_limit_per_minute);
        assert!(parsed.provider_api_key.is_none());
    }

    #[test]
    fn config_toml_worker_section_partial() {
        let toml = r#"
            data_dir = "/tmp/bf"
            download_dir = "/tmp/bf/out"
            provider_base_url = "http://127.0.0.1:9000"
            provider_api_key = "secret"
            rate_limit_per_minute = 30
            max_concurrent_transfers = 4

            [worker]
            poll_attempts = 3
            chunk_size = 65536
        "#;
        let cfg: BoxfetchConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.provider_api_key.as_deref(), Some("secret"));
        assert_eq!(cfg.max_concurrent_transfers, 4);
        let worker = cfg.worker();
        assert_eq!(worker.poll_attempts, 3);
        assert_eq!(worker.chunk_size, 65536);
        assert_eq!(worker.poll_interval(), Duration::from_secs(2));
        assert_eq!(worker.max_poll_errors, 5);
    }

    #[test]
    fn env_overrides_api_key() {
        let mut cfg = BoxfetchConfig::default();
        cfg.provider_api_key = Some("from-file".into());
        cfg.apply_env(|name| (name == API_KEY_ENV).then(|| " from-env ".to_string()));
        assert_eq!(cfg.provider_api_key.as_deref(), Some("from-env"));

        cfg.apply_env(|_| Some("   ".to_string()));
        assert_eq!(cfg.provider_api_key.as_deref(), Some("from-env"));
    }

    #[test]
    fn load_or_init_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf/config.toml");
        let cfg = load_or_init_at(&path, &dir.path().join("share")).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.download_dir, dir.path().join("share/downloads"));

        let again = load_or_init_at(&path, Path::new("/ignored")).unwrap();
        assert_eq!(again.data_dir, dir.path().join("share"));
    }
}
