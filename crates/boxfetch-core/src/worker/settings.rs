//! Effective worker settings: settings-table rows layered over `BoxfetchConfig`.
//!
//! Re-read every tick so changes made while the worker runs (e.g. `boxfetch settings
//! set`) take effect without a restart. The rate limit and transfer concurrency are
//! fixed when the worker starts.

use anyhow::Result;
use std::path::PathBuf;

use crate::config::BoxfetchConfig;
use crate::error::JobError;
use crate::job_store::{keys, JobStore};
use crate::notify::{self, Scanner};
use crate::provider::ProviderAuth;

#[derive(Debug, Clone)]
pub struct ResolvedSettings {
    auth: Option<ProviderAuth>,
    pub output_root: PathBuf,
    pub delete_on_complete_provider: bool,
    /// Intake root, when intake is enabled and a path is set.
    pub intake: Option<PathBuf>,
    pub scanners: Vec<Scanner>,
}

impl ResolvedSettings {
    pub async fn load(store: &JobStore, cfg: &BoxfetchConfig) -> Result<Self> {
        let base_url = store
            .get_nonempty_setting(keys::PROVIDER_BASE_URL)
            .await?
            .unwrap_or_else(|| cfg.provider_base_url.clone());
        let api_key = match store.get_nonempty_setting(keys::PROVIDER_API_KEY).await? {
            Some(key) => Some(key),
            None => cfg
                .provider_api_key
                .as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string),
        };
        let output_root = store
            .get_nonempty_setting(keys::DOWNLOAD_FOLDER)
            .await?
            .map(PathBuf::from)
            .unwrap_or_else(|| cfg.download_dir.clone());
        let delete_on_complete_provider = flag(store, keys::DELETE_ON_COMPLETE_PROVIDER).await?;
        let intake = if flag(store, keys::INTAKE_ENABLED).await? {
            store
                .get_nonempty_setting(keys::INTAKE_PATH)
                .await?
                .map(PathBuf::from)
        } else {
            None
        };

        Ok(Self {
            auth: api_key.map(|api_key| ProviderAuth { base_url, api_key }),
            output_root,
            delete_on_complete_provider,
            intake,
            scanners: notify::configured_scanners(store).await?,
        })
    }

    pub fn auth(&self) -> Option<&ProviderAuth> {
        self.auth.as_ref()
    }

    /// Provider credentials, or a configuration error naming the missing key.
    pub fn require_auth(&self) -> Result<&ProviderAuth, JobError> {
        self.auth.as_ref().ok_or_else(|| {
            JobError::Configuration(format!(
                "no provider API key (set `{}` or {})",
                keys::PROVIDER_API_KEY,
                crate::config::API_KEY_ENV
            ))
        })
    }
}

async fn flag(store: &JobStore, key: &str) -> Result<bool> {
    Ok(store
        .get_setting(key)
        .await?
        .is_some_and(|v| keys::is_truthy(&v)))
}

/// Positive integer setting, falling back to `default` when unset or invalid.
pub async fn numeric_override(store: &JobStore, key: &str, default: u64) -> Result<u64> {
    let Some(raw) = store.get_nonempty_setting(key).await? else {
        return Ok(default);
    };
    match raw.parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => {
            tracing::warn!(key, value = %raw, "ignoring invalid setting; using {default}");
            Ok(default)
        }
    }
}
