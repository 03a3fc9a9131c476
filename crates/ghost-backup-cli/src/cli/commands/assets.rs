//! `ghost-backup assets` – mirror local images referenced by the saved export.

use anyhow::Result;
use ghost_backup_core::assets;
use ghost_backup_core::downloader::{AssetEvent, CurlFetcher, Tally};
use std::sync::Arc;

use crate::cli::settings::RunSettings;

pub async fn run_assets(settings: &RunSettings, concurrency: usize) -> Result<Tally> {
    if settings.api_url.is_none() {
        tracing::warn!("no API base URL set; root-relative image paths will be skipped");
    }

    let (tx, mut rx) = tokio::sync::mpsc::channel::<AssetEvent>(64);
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                AssetEvent::Discovered { count } => {
                    println!("Found {} local asset URL(s)", count)
                }
                AssetEvent::Downloaded { url, .. } => println!("✓ {}", url),
                AssetEvent::Failed { url, error } => eprintln!("✗ {} ({})", url, error),
                AssetEvent::Skipped { .. } => {}
            }
        }
    });

    let fetcher = Arc::new(CurlFetcher::new(settings.http.clone()));
    let result = assets::run(
        &settings.layout,
        settings.api_url.as_deref(),
        concurrency,
        fetcher,
        Some(tx),
    )
    .await;
    let _ = printer.await;

    let report = result?;
    let tally = report.tally;
    if tally.skipped > 0 {
        tracing::info!("{} asset(s) already on disk", tally.skipped);
    }
    println!("Assets done. {}", tally);
    Ok(tally)
}
