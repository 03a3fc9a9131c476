//! Asset fetching seam: the pool only depends on [`AssetFetcher`].

use crate::http::{self, HttpError, HttpOptions};

/// Fetches one asset body. Implementations must be shareable across worker threads.
pub trait AssetFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, HttpError>;
}

/// Single GET through libcurl, redirects followed, no retry. Non-2xx is an error.
#[derive(Debug, Clone, Default)]
pub struct CurlFetcher {
    opts: HttpOptions,
}

impl CurlFetcher {
    pub fn new(opts: HttpOptions) -> Self {
        Self { opts }
    }
}

impl AssetFetcher for CurlFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        let resp = http::get(url, &self.opts)?.ensure_success("GET", url)?;
        Ok(resp.body)
    }
}
