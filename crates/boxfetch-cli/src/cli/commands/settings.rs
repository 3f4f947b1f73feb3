//! `boxfetch settings get|set|list|unset` – persistent settings.

use anyhow::{bail, Result};
use boxfetch_core::job_store::{keys, JobStore};

use crate::cli::SettingsAction;

pub async fn run_settings(store: &JobStore, action: SettingsAction) -> Result<()> {
    match action {
        SettingsAction::Get { key } => match store.get_setting(&key).await? {
            Some(value) => println!("{value}"),
            None => bail!("`{key}` is not set"),
        },
        SettingsAction::Set { key, value } => {
            validate(&key, &value)?;
            store.set_setting(&key, value.trim()).await?;
            println!("Set {key}");
        }
        SettingsAction::List => {
            let rows = store.list_settings().await?;
            if rows.is_empty() {
                println!("No settings stored.");
            }
            for (key, value) in rows {
                println!("{key} = {}", display_value(&key, &value));
            }
        }
        SettingsAction::Unset { key } => {
            if !store.delete_setting(&key).await? {
                bail!("`{key}` is not set");
            }
            println!("Unset {key}");
        }
    }
    Ok(())
}

fn validate(key: &str, value: &str) -> Result<()> {
    if !keys::KNOWN.contains(&key) {
        bail!(
            "unknown setting `{key}`; known settings: {}",
            keys::KNOWN.join(", ")
        );
    }
    if keys::NUMERIC.contains(&key) && !matches!(value.trim().parse::<u64>(), Ok(n) if n > 0) {
        bail!("`{key}` must be a positive integer");
    }
    Ok(())
}

fn display_value(key: &str, value: &str) -> String {
    if keys::is_secret(key) && !value.is_empty() {
        "********".to_string()
    } else {
        value.to_string()
    }
}
