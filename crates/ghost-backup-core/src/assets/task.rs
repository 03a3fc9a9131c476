//! Download tasks: source URL paired with its mirrored destination path.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use super::extract::{CandidateUrls, LOCAL_IMAGE_MARKER};

/// One unit of work: fetch `url`, store at `dest`.
///
/// `aliases` are other candidate URLs with the same destination. They are not
/// fetched; each one is tallied with the outcome of `url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub url: String,
    pub dest: PathBuf,
    pub aliases: Vec<String>,
}

impl DownloadTask {
    pub fn new(url: impl Into<String>, dest: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            dest: dest.into(),
            aliases: Vec::new(),
        }
    }

    /// Number of candidate URLs this task accounts for.
    pub fn url_count(&self) -> usize {
        1 + self.aliases.len()
    }
}

/// Part of `url` after the first local-image marker, e.g. `2024/01/x.png`.
///
/// Returns `None` when there is no marker, nothing follows it, or the remainder
/// would escape the assets root (`..`, absolute paths).
pub fn relative_asset_path(url: &str) -> Option<&str> {
    let start = url.find(LOCAL_IMAGE_MARKER)? + LOCAL_IMAGE_MARKER.len();
    let rel = &url[start..];
    if rel.is_empty() {
        return None;
    }
    let safe = Path::new(rel)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    safe.then_some(rel)
}

/// Builds one task per candidate URL under `assets_root`.
///
/// URLs without a usable relative path are dropped with a warning. When two
/// URLs map to the same destination, the later one becomes an alias of the
/// first task, so one file is never written by two workers.
pub fn plan_tasks(urls: &CandidateUrls, assets_root: &Path) -> Vec<DownloadTask> {
    let mut by_dest: HashMap<PathBuf, usize> = HashMap::new();
    let mut tasks: Vec<DownloadTask> = Vec::with_capacity(urls.len());
    for url in urls.iter() {
        let Some(rel) = relative_asset_path(url) else {
            tracing::warn!(url, "no usable path after {}; skipping", LOCAL_IMAGE_MARKER);
            continue;
        };
        let dest = assets_root.join(rel);
        if let Some(&idx) = by_dest.get(&dest) {
            tracing::debug!(url, first = %tasks[idx].url, "destination already claimed; tallied as alias");
            tasks[idx].aliases.push(url.to_string());
            continue;
        }
        by_dest.insert(dest.clone(), tasks.len());
        tasks.push(DownloadTask::new(url, dest));
    }
    tasks
}
