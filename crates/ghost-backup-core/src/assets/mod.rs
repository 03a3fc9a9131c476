//! Asset extraction pipeline: read the export, find local image references,
//! plan download tasks and hand them to the bounded downloader.
//!
//! Fatal problems (export missing, unreadable or not JSON) surface as
//! [`AssetsError`] before any request is made. Per-asset failures only show
//! up in the returned [`Tally`].

mod extract;
mod task;
mod walker;

pub use extract::{normalize_to_absolute, CandidateUrls, Extractor, LOCAL_IMAGE_MARKER};
pub use task::{plan_tasks, relative_asset_path, DownloadTask};
pub use walker::{walk_strings, Strings};

use anyhow::Result;
use serde_json::Value;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::Sender;

use crate::downloader::{self, AssetEvent, AssetFetcher, Tally};
use crate::layout::BackupLayout;

#[derive(Debug, Error)]
pub enum AssetsError {
    #[error("Export JSON not found: {}", path.display())]
    MissingExport { path: PathBuf },
    #[error("read export {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parse export {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid local-image pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Reads and parses the export file.
pub fn load_export(path: &Path) -> Result<Value, AssetsError> {
    if !path.exists() {
        return Err(AssetsError::MissingExport {
            path: path.to_path_buf(),
        });
    }
    let raw = std::fs::read(path).map_err(|source| AssetsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&raw).map_err(|source| AssetsError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Candidate URLs and the tasks derived from them.
#[derive(Debug, Clone)]
pub struct AssetPlan {
    pub urls: CandidateUrls,
    pub tasks: Vec<DownloadTask>,
}

/// Loads the run's export and plans one task per discovered image.
pub fn plan(layout: &BackupLayout, base_url: Option<&str>) -> Result<AssetPlan, AssetsError> {
    let export = load_export(&layout.export_path)?;
    let urls = Extractor::new(base_url)?.extract(&export);
    let tasks = plan_tasks(&urls, &layout.assets_root);
    tracing::info!(
        urls = urls.len(),
        tasks = tasks.len(),
        "planned asset downloads from {}",
        layout.export_path.display()
    );
    Ok(AssetPlan { urls, tasks })
}

/// Outcome of an asset run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetsReport {
    pub discovered: usize,
    pub tally: Tally,
}

/// Plans and downloads all assets for `layout`.
///
/// Sends [`AssetEvent::Discovered`] first, then one event per task. The blocking
/// download pool runs on the blocking thread pool.
pub async fn run(
    layout: &BackupLayout,
    base_url: Option<&str>,
    limit: usize,
    fetcher: Arc<dyn AssetFetcher>,
    events: Option<Sender<AssetEvent>>,
) -> Result<AssetsReport> {
    let AssetPlan { urls, tasks } = plan(layout, base_url)?;
    let discovered = urls.len();
    if let Some(tx) = &events {
        let _ = tx.send(AssetEvent::Discovered { count: discovered }).await;
    }

    let tally = tokio::task::spawn_blocking(move || {
        downloader::download_all(&tasks, limit, fetcher.as_ref(), events.as_ref())
    })
    .await
    .map_err(|e| anyhow::anyhow!("asset download task join: {}", e))?;

    tracing::info!(
        succeeded = tally.succeeded,
        failed = tally.failed,
        skipped = tally.skipped,
        "asset run finished"
    );
    Ok(AssetsReport { discovered, tally })
}
