//! CLI for ghost-backup.

mod commands;
mod settings;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use ghost_backup_core::config::{self, Credentials};
use std::path::PathBuf;

use commands::{run_assets, run_backup, run_export};
use settings::RunSettings;

/// Top-level CLI for ghost-backup.
#[derive(Debug, Parser)]
#[command(name = "ghost-backup")]
#[command(about = "Back up a Ghost blog: admin API JSON export plus locally hosted images", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.config/ghost-backup/config.toml when present).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory under which `<date>/` run directories are created (overrides config).
    #[arg(long, global = true, value_name = "DIR")]
    pub output_root: Option<PathBuf>,

    /// Date tag naming the run directory, e.g. 2024-01-01.
    #[arg(long = "date", global = true, env = "BACKUP_DATE", value_name = "TAG")]
    pub date_tag: Option<String>,

    /// Blog base URL, e.g. https://blog.example.com.
    #[arg(long, global = true, env = "GHOST_ADMIN_API_URL", value_name = "URL")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Log in to the admin API and save the JSON export.
    Export {
        #[command(flatten)]
        auth: AuthArgs,
    },

    /// Mirror every /content/images/ asset referenced by a saved export.
    Assets {
        #[command(flatten)]
        pool: PoolArgs,
    },

    /// Run `export` then `assets` for the same date tag.
    Backup {
        #[command(flatten)]
        auth: AuthArgs,
        #[command(flatten)]
        pool: PoolArgs,
    },
}

#[derive(Debug, Clone, Args)]
pub struct AuthArgs {
    /// Admin username (email).
    #[arg(long, env = "GHOST_USERNAME")]
    pub username: Option<String>,

    /// Admin password.
    #[arg(long, env = "GHOST_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct PoolArgs {
    /// Maximum concurrent asset downloads (default from config, 6).
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,
}

impl AuthArgs {
    fn credentials(&self) -> Result<Credentials> {
        Credentials::resolve(self.username.as_deref(), self.password.as_deref())
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load(cli.config.as_deref())?;
        tracing::debug!("loaded config: {:?}", cfg);
        let settings = RunSettings::resolve(
            cli.output_root.as_deref(),
            cli.date_tag.as_deref(),
            cli.api_url.as_deref(),
            &cfg,
        )?;

        match cli.command {
            CliCommand::Export { auth } => {
                run_export(&settings, &auth.credentials()?).await?;
            }
            CliCommand::Assets { pool } => {
                run_assets(&settings, settings.concurrency(pool.concurrency)).await?;
            }
            CliCommand::Backup { auth, pool } => {
                let creds = auth.credentials()?;
                run_backup(&settings, &creds, settings.concurrency(pool.concurrency)).await?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
