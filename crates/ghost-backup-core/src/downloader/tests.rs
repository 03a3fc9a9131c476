use super::*;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

/// In-memory fetcher: serves bodies by URL, 404 otherwise, records every call.
#[derive(Default)]
struct MockFetcher {
    bodies: HashMap<String, Vec<u8>>,
    statuses: HashMap<String, u32>,
    calls: Mutex<Vec<String>>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockFetcher {
    fn with_body(mut self, url: &str, body: &[u8]) -> Self {
        self.bodies.insert(url.to_string(), body.to_vec());
        self
    }

    fn with_status(mut self, url: &str, code: u32) -> Self {
        self.statuses.insert(url.to_string(), code);
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl AssetFetcher for MockFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.calls.lock().unwrap().push(url.to_string());
        if let Some(d) = self.delay {
            std::thread::sleep(d);
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if let Some(code) = self.statuses.get(url) {
            return Err(HttpError::Status {
                method: "GET",
                url: url.to_string(),
                code: *code,
            });
        }
        self.bodies.get(url).cloned().ok_or_else(|| HttpError::Status {
            method: "GET",
            url: url.to_string(),
            code: 404,
        })
    }
}

fn task(root: &Path, rel: &str) -> DownloadTask {
    DownloadTask::new(
        format!("https://blog.example.com/content/images/{}", rel),
        root.join(rel),
    )
}

#[test]
fn worker_count_clamps() {
    assert_eq!(worker_count(6, 100), 6);
    assert_eq!(worker_count(6, 2), 2);
    assert_eq!(worker_count(0, 5), 1);
    assert_eq!(worker_count(6, 0), 1);
    assert_eq!(worker_count(1, 1), 1);
}

#[test]
fn downloads_and_writes_under_dest() {
    let dir = tempfile::tempdir().unwrap();
    let t = task(dir.path(), "2024/01/x.png");
    let fetcher = MockFetcher::default().with_body(&t.url, b"png-bytes");
    let tally = download_all(&[t.clone()], 6, &fetcher, None);
    assert_eq!(
        tally,
        Tally {
            succeeded: 1,
            failed: 0,
            skipped: 0
        }
    );
    assert_eq!(std::fs::read(&t.dest).unwrap(), b"png-bytes");
}

#[test]
fn existing_file_is_skipped_without_network() {
    let dir = tempfile::tempdir().unwrap();
    let t = task(dir.path(), "2024/01/x.png");
    std::fs::create_dir_all(t.dest.parent().unwrap()).unwrap();
    std::fs::write(&t.dest, b"old").unwrap();
    let fetcher = MockFetcher::default().with_body(&t.url, b"new");

    let tally = download_all(&[t.clone()], 6, &fetcher, None);

    assert!(fetcher.calls().is_empty());
    assert_eq!(tally.succeeded, 1);
    assert_eq!(tally.skipped, 1);
    assert_eq!(tally.failed, 0);
    assert_eq!(std::fs::read(&t.dest).unwrap(), b"old");
}

#[test]
fn one_server_error_does_not_stop_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    let tasks: Vec<DownloadTask> = (0..5)
        .map(|i| task(dir.path(), &format!("img{}.png", i)))
        .collect();
    let mut fetcher = MockFetcher::default();
    for (i, t) in tasks.iter().enumerate() {
        fetcher = fetcher.with_body(&t.url, format!("body{}", i).as_bytes());
    }
    let fetcher = fetcher.with_status(&tasks[2].url, 500);

    let tally = download_all(&tasks, 6, &fetcher, None);

    assert_eq!(tally.succeeded, 4);
    assert_eq!(tally.failed, 1);
    for (i, t) in tasks.iter().enumerate() {
        if i == 2 {
            assert!(!t.dest.exists());
            assert!(!storage::temp_path(&t.dest).exists());
        } else {
            assert_eq!(std::fs::read(&t.dest).unwrap(), format!("body{}", i).as_bytes());
        }
    }
}

#[test]
fn every_task_claimed_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let tasks: Vec<DownloadTask> = (0..200)
        .map(|i| task(dir.path(), &format!("{}/{}.jpg", i % 7, i)))
        .collect();
    let mut fetcher = MockFetcher::default();
    for t in &tasks {
        fetcher = fetcher.with_body(&t.url, b"x");
    }

    let tally = download_all(&tasks, 6, &fetcher, None);

    assert_eq!(tally.succeeded, 200);
    let mut calls = fetcher.calls();
    calls.sort();
    let mut expected: Vec<String> = tasks.iter().map(|t| t.url.clone()).collect();
    expected.sort();
    assert_eq!(calls, expected);
}

#[test]
fn in_flight_never_exceeds_limit() {
    let dir = tempfile::tempdir().unwrap();
    let tasks: Vec<DownloadTask> = (0..24)
        .map(|i| task(dir.path(), &format!("{}.gif", i)))
        .collect();
    let mut fetcher = MockFetcher {
        delay: Some(Duration::from_millis(10)),
        ..Default::default()
    };
    for t in &tasks {
        fetcher = fetcher.with_body(&t.url, b"g");
    }

    let tally = download_all(&tasks, 3, &fetcher, None);

    assert_eq!(tally.succeeded, 24);
    assert!(fetcher.max_in_flight.load(Ordering::SeqCst) <= 3);
}

#[test]
fn storage_failure_is_tallied() {
    let dir = tempfile::tempdir().unwrap();
    // A regular file where a directory is needed.
    std::fs::write(dir.path().join("2024"), b"not a dir").unwrap();
    let t = task(dir.path(), "2024/01/x.png");
    let fetcher = MockFetcher::default().with_body(&t.url, b"x");

    let err = process_task(&t, &fetcher).unwrap_err();
    assert!(matches!(err, AssetError::Storage { .. }));

    let tally = download_all(&[t], 2, &fetcher, None);
    assert_eq!(tally.failed, 1);
    assert_eq!(tally.succeeded, 0);
}

#[test]
fn empty_task_list() {
    let fetcher = MockFetcher::default();
    assert_eq!(download_all(&[], 6, &fetcher, None), Tally::default());
    assert!(fetcher.calls().is_empty());
}

#[test]
fn events_report_each_task() {
    let dir = tempfile::tempdir().unwrap();
    let ok = task(dir.path(), "ok.png");
    let bad = task(dir.path(), "bad.png");
    let cached = task(dir.path(), "cached.png");
    std::fs::write(&cached.dest, b"c").unwrap();
    let fetcher = MockFetcher::default()
        .with_body(&ok.url, b"1234")
        .with_status(&bad.url, 500);
    let (tx, mut rx) = tokio::sync::mpsc::channel(16);

    let tally = download_all(&[ok.clone(), bad.clone(), cached.clone()], 1, &fetcher, Some(&tx));
    drop(tx);

    let mut events = Vec::new();
    while let Ok(e) = rx.try_recv() {
        events.push(e);
    }
    assert_eq!(
        events,
        vec![
            AssetEvent::Downloaded {
                url: ok.url.clone(),
                bytes: 4
            },
            AssetEvent::Failed {
                url: bad.url.clone(),
                error: format!("GET {} → 500", bad.url),
            },
            AssetEvent::Skipped {
                url: cached.url.clone()
            },
        ]
    );
    assert_eq!(
        tally,
        Tally {
            succeeded: 2,
            failed: 1,
            skipped: 1
        }
    );
}

#[test]
fn tally_add() {
    let a = Tally {
        succeeded: 2,
        failed: 1,
        skipped: 1,
    };
    let b = Tally {
        succeeded: 3,
        failed: 0,
        skipped: 2,
    };
    assert_eq!(
        a + b,
        Tally {
            succeeded: 5,
            failed: 1,
            skipped: 3
        }
    );
}

#[test]
fn aliases_share_the_outcome_of_their_task() {
    let dir = tempfile::tempdir().unwrap();
    let mut ok = task(dir.path(), "a.png");
    ok.aliases.push("http://blog.example.com/content/images/a.png".into());
    let mut bad = task(dir.path(), "b.png");
    bad.aliases.push("http://blog.example.com/content/images/b.png".into());
    let fetcher = MockFetcher::default()
        .with_body(&ok.url, b"a")
        .with_status(&bad.url, 503);
    let (tx, mut rx) = tokio::sync::mpsc::channel(16);

    let tally = download_all(&[ok.clone(), bad.clone()], 1, &fetcher, Some(&tx));
    drop(tx);

    assert_eq!(fetcher.calls(), vec![ok.url.clone(), bad.url.clone()]);
    assert_eq!(
        tally,
        Tally {
            succeeded: 2,
            failed: 2,
            skipped: 1
        }
    );
    assert_eq!(tally.succeeded + tally.failed, ok.url_count() + bad.url_count());
    let mut events = Vec::new();
    while let Ok(e) = rx.try_recv() {
        events.push(e);
    }
    assert_eq!(events.len(), 4);
    assert_eq!(
        events[1],
        AssetEvent::Skipped {
            url: ok.aliases[0].clone()
        }
    );
    assert!(matches!(&events[3], AssetEvent::Failed { url, .. } if *url == bad.aliases[0]));
}

#[test]
fn tally_display_is_the_console_summary() {
    let tally = Tally {
        succeeded: 1,
        failed: 0,
        skipped: 0,
    };
    assert_eq!(format!("Assets done. {}", tally), "Assets done. Success: 1, Failed: 0");
    let tally = Tally {
        succeeded: 12,
        failed: 3,
        skipped: 7,
    };
    assert_eq!(tally.to_string(), "Success: 12, Failed: 3");
}
