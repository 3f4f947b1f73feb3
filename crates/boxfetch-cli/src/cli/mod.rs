//! CLI for the boxfetch provider fetch worker.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use boxfetch_core::config;
use boxfetch_core::job_store::{Category, JobStore, SourceType};
use std::path::PathBuf;

use commands::{run_add, run_cancel, run_remove, run_settings, run_status, run_worker};

/// Top-level CLI for boxfetch.
#[derive(Debug, Parser)]
#[command(name = "boxfetch")]
#[command(about = "boxfetch: fetch torrents/NZBs through a cloud provider into your library", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Queue a .torrent or .nzb file.
    Add {
        /// Path to the description file.
        path: PathBuf,
        /// Source kind; inferred from the file extension when omitted.
        #[arg(long, value_parser = parse_kind)]
        kind: Option<SourceType>,
        /// Library the result belongs to (radarr, sonarr, whisparr).
        #[arg(long, value_parser = parse_category)]
        category: Option<Category>,
    },

    /// Run the worker until interrupted (Ctrl-C).
    Run,

    /// Show status of all jobs.
    Status,

    /// Cancel a job that has not finished yet.
    Cancel {
        /// Job identifier.
        id: i64,
    },

    /// Remove a job and its uploaded files.
    Remove {
        /// Job identifier.
        id: i64,
    },

    /// Inspect or change persistent settings.
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum SettingsAction {
    /// Print one setting.
    Get { key: String },
    /// Store a setting.
    Set { key: String, value: String },
    /// List all settings (API keys masked).
    List,
    /// Delete a setting.
    Unset { key: String },
}

fn parse_kind(s: &str) -> Result<SourceType, String> {
    SourceType::parse(s).ok_or_else(|| format!("unknown kind `{s}` (expected torrent or nzb)"))
}

fn parse_category(s: &str) -> Result<Category, String> {
    Category::parse(s)
        .ok_or_else(|| format!("unknown category `{s}` (expected radarr, sonarr or whisparr)"))
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        let store = JobStore::open_default().await?;

        match cli.command {
            CliCommand::Add {
                path,
                kind,
                category,
            } => run_add(&store, &cfg, &path, kind, category).await?,
            CliCommand::Run => run_worker(store, cfg).await?,
            CliCommand::Status => run_status(&store).await?,
            CliCommand::Cancel { id } => run_cancel(&store, id).await?,
            CliCommand::Remove { id } => run_remove(&store, id).await?,
            CliCommand::Settings { action } => run_settings(&store, action).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
