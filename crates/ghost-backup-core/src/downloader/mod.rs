//! Bounded concurrent asset downloader.
//!
//! N worker threads claim task indices from a shared atomic counter until the
//! list is exhausted, so every task is processed exactly once. A failing task
//! is logged and tallied; it never stops the other workers.

mod fetch;

pub use fetch::{AssetFetcher, CurlFetcher};

use std::fmt;
use std::io;
use std::ops::Add;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tokio::sync::mpsc::Sender;

use crate::assets::DownloadTask;
use crate::http::HttpError;
use crate::storage;

/// Per-task failure. Reported through [`AssetEvent::Failed`] and the tally only.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error("write {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Progress notifications for the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetEvent {
    /// Size of the Candidate URL Set, sent once before any download starts.
    Discovered { count: usize },
    /// Destination already existed; no request was made.
    Skipped { url: String },
    Downloaded { url: String, bytes: u64 },
    Failed { url: String, error: String },
}

/// Success/failure counts. Skipped tasks count as successes and are also reported in `skipped`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl Add for Tally {
    type Output = Tally;

    fn add(self, other: Tally) -> Tally {
        Tally {
            succeeded: self.succeeded + other.succeeded,
            failed: self.failed + other.failed,
            skipped: self.skipped + other.skipped,
        }
    }
}

/// Console summary: `Success: X, Failed: Y`.
impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Success: {}, Failed: {}", self.succeeded, self.failed)
    }
}

/// What happened to a task that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Skipped,
    Downloaded(u64),
}

/// Number of workers: `limit` clamped to `1..=pending` (one worker when nothing is pending).
pub fn worker_count(limit: usize, pending: usize) -> usize {
    limit.max(1).min(pending.max(1))
}

/// Runs one task: skip if `dest` exists, else fetch and write atomically.
pub fn process_task(
    task: &DownloadTask,
    fetcher: &dyn AssetFetcher,
) -> Result<TaskOutcome, AssetError> {
    if task.dest.exists() {
        return Ok(TaskOutcome::Skipped);
    }
    let body = fetcher.fetch(&task.url)?;
    storage::write_atomic(&task.dest, &body).map_err(|source| AssetError::Storage {
        path: task.dest.clone(),
        source,
    })?;
    Ok(TaskOutcome::Downloaded(body.len() as u64))
}

/// Downloads every task with at most `limit` in flight and returns the combined tally.
///
/// The tally covers every URL, aliases included, so `succeeded + failed` equals
/// the number of candidate URLs the tasks were planned from.
///
/// Blocks until all workers have drained the list. Call from `spawn_blocking`
/// when running inside a tokio runtime. Events are sent with `blocking_send`;
/// a closed receiver is ignored.
pub fn download_all(
    tasks: &[DownloadTask],
    limit: usize,
    fetcher: &dyn AssetFetcher,
    events: Option<&Sender<AssetEvent>>,
) -> Tally {
    let next = AtomicUsize::new(0);
    let workers = worker_count(limit, tasks.len());
    tracing::debug!(tasks = tasks.len(), workers, "starting asset workers");

    std::thread::scope(|s| {
        let next = &next;
        let handles: Vec<_> = (0..workers)
            .map(|id| s.spawn(move || run_worker(id, tasks, next, fetcher, events)))
            .collect();
        handles
            .into_iter()
            .fold(Tally::default(), |acc, h| match h.join() {
                Ok(t) => acc + t,
                Err(_) => {
                    tracing::error!("asset worker panicked");
                    acc
                }
            })
    })
}

fn run_worker(
    id: usize,
    tasks: &[DownloadTask],
    next: &AtomicUsize,
    fetcher: &dyn AssetFetcher,
    events: Option<&Sender<AssetEvent>>,
) -> Tally {
    let mut tally = Tally::default();
    loop {
        // fetch_add is the claim: each index goes to exactly one worker.
        let idx = next.fetch_add(1, Ordering::Relaxed);
        let Some(task) = tasks.get(idx) else {
            break;
        };
        match process_task(task, fetcher) {
            Ok(TaskOutcome::Skipped) => {
                tracing::debug!(worker = id, url = %task.url, "already on disk");
                tally.succeeded += 1;
                tally.skipped += 1;
                emit(events, AssetEvent::Skipped { url: task.url.clone() });
            }
            Ok(TaskOutcome::Downloaded(bytes)) => {
                tracing::info!(worker = id, url = %task.url, bytes, "asset saved to {}", task.dest.display());
                tally.succeeded += 1;
                emit(
                    events,
                    AssetEvent::Downloaded {
                        url: task.url.clone(),
                        bytes,
                    },
                );
            }
            Err(e) => {
                tracing::warn!(worker = id, url = %task.url, "asset download failed: {}", e);
                tally.failed += 1;
                emit(
                    events,
                    AssetEvent::Failed {
                        url: task.url.clone(),
                        error: e.to_string(),
                    },
                );
                // Aliases share the destination, so they share the failure.
                for alias in &task.aliases {
                    tally.failed += 1;
                    emit(
                        events,
                        AssetEvent::Failed {
                            url: alias.clone(),
                            error: e.to_string(),
                        },
                    );
                }
                continue;
            }
        }
        // The file is on disk now; aliases count as skipped successes.
        for alias in &task.aliases {
            tally.succeeded += 1;
            tally.skipped += 1;
            emit(events, AssetEvent::Skipped { url: alias.clone() });
        }
    }
    tracing::debug!(worker = id, ?tally, "asset worker done");
    tally
}

fn emit(events: Option<&Sender<AssetEvent>>, event: AssetEvent) {
    if let Some(tx) = events {
        let _ = tx.blocking_send(event);
    }
}

#[cfg(test)]
mod tests;
