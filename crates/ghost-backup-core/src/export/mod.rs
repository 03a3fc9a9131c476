//! Export fetcher: authenticates against the admin API and saves the JSON
//! database export to the run's `export_path`.
//!
//! Blocking (libcurl); wrap in `spawn_blocking` from async code.

mod session;

pub use session::{admin_base, create_session, SESSION_COOKIE};

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::Credentials;
use crate::http::{self, HttpError, HttpOptions};
use crate::layout::BackupLayout;

/// Response body characters kept in error messages.
pub(crate) const ERROR_BODY_CHARS: usize = 500;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Authentication failed ({code}): {body}")]
    Auth { code: u32, body: String },
    #[error("No session token received from authentication")]
    NoSession,
    #[error("DB export failed ({code}): {body}")]
    Export { code: u32, body: String },
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error("encode login request: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("write export {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Logs in with `creds`, downloads `GET /db/` and writes it to `layout.export_path`.
///
/// `api_url` is the blog's base URL; it is also sent as `Origin`, which the admin
/// API requires for session auth. Returns the written path.
pub fn fetch_export(
    api_url: &str,
    creds: &Credentials,
    layout: &BackupLayout,
    opts: &HttpOptions,
) -> Result<PathBuf, ExportError> {
    let api_url = api_url.trim_end_matches('/');
    let admin = admin_base(api_url);
    let opts = opts.clone().with_header("Origin", api_url);

    let token = create_session(&admin, creds, &opts)?;
    tracing::debug!("admin session established");

    let db_url = format!("{}/db/", admin);
    let cookie = format!("{}={}", SESSION_COOKIE, token);
    let resp = http::get(&db_url, &opts.clone().with_header("Cookie", &cookie))?;
    if !resp.is_success() {
        return Err(ExportError::Export {
            code: resp.status,
            body: resp.body_snippet(ERROR_BODY_CHARS),
        });
    }

    let write_err = |source| ExportError::Write {
        path: layout.export_path.clone(),
        source,
    };
    std::fs::create_dir_all(&layout.day_dir).map_err(write_err)?;
    std::fs::write(&layout.export_path, &resp.body).map_err(write_err)?;
    tracing::info!(
        bytes = resp.body.len(),
        "saved export to {}",
        layout.export_path.display()
    );
    Ok(layout.export_path.clone())
}
