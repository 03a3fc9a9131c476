//! `ghost-backup backup` – export, then mirror assets into the same run directory.

use anyhow::Result;
use ghost_backup_core::config::Credentials;

use super::{run_assets, run_export};
use crate::cli::settings::RunSettings;

pub async fn run_backup(
    settings: &RunSettings,
    creds: &Credentials,
    concurrency: usize,
) -> Result<()> {
    run_export(settings, creds).await?;
    let tally = run_assets(settings, concurrency).await?;
    tracing::info!(
        "backup {} complete ({} asset(s), {} failed)",
        settings.layout.date_tag,
        tally.succeeded + tally.failed,
        tally.failed
    );
    Ok(())
}
