//! `ghost-backup export` – save the admin API JSON export for the date tag.

use anyhow::Result;
use ghost_backup_core::config::Credentials;
use ghost_backup_core::export;

use crate::cli::settings::RunSettings;

pub async fn run_export(settings: &RunSettings, creds: &Credentials) -> Result<()> {
    let api_url = settings.require_api_url()?.to_string();
    let creds = creds.clone();
    let layout = settings.layout.clone();
    let opts = settings.http.clone();

    let path = tokio::task::spawn_blocking(move || {
        export::fetch_export(&api_url, &creds, &layout, &opts)
    })
    .await
    .map_err(|e| anyhow::anyhow!("export task join: {}", e))??;

    println!("Saved {}", path.display());
    Ok(())
}
