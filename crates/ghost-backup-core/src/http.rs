//! Blocking HTTP via the curl crate (libcurl).
//!
//! Bodies are buffered fully in memory. Redirects are followed. Call from
//! `spawn_blocking` or a worker thread when used from async code.

use std::str;
use std::time::Duration;
use thiserror::Error;

/// Redirect hops followed before libcurl gives up.
const MAX_REDIRECTS: u32 = 10;

#[derive(Debug, Error)]
pub enum HttpError {
    /// Connection, TLS, DNS or other transport failure reported by libcurl.
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// The final response (after redirects) had a non-2xx status.
    #[error("{method} {url} → {code}")]
    Status {
        method: &'static str,
        url: String,
        code: u32,
    },
}

/// Per-request settings.
#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub connect_timeout: Duration,
    pub user_agent: String,
    /// Extra request headers as (name, value).
    pub headers: Vec<(String, String)>,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            user_agent: format!("ghost-backup/{}", env!("CARGO_PKG_VERSION")),
            headers: Vec::new(),
        }
    }
}

impl HttpOptions {
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// Status, raw header lines (every hop, in order) and the buffered body.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u32,
    pub headers: Vec<String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns `self` for 2xx, otherwise `HttpError::Status`.
    pub fn ensure_success(self, method: &'static str, url: &str) -> Result<Self, HttpError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(HttpError::Status {
                method,
                url: url.to_string(),
                code: self.status,
            })
        }
    }

    /// Values of header `name` from the final response only (redirect hops are ignored).
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        let start = self
            .headers
            .iter()
            .rposition(|l| l.starts_with("HTTP/"))
            .map_or(0, |i| i + 1);
        self.headers[start..].iter().filter_map(move |line| {
            let (k, v) = line.split_once(':')?;
            k.trim().eq_ignore_ascii_case(name).then(|| v.trim())
        })
    }

    pub fn header<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        self.header_values(name).next()
    }

    /// First `max_chars` characters of the body, lossily decoded (for error messages).
    pub fn body_snippet(&self, max_chars: usize) -> String {
        String::from_utf8_lossy(&self.body)
            .chars()
            .take(max_chars)
            .collect()
    }
}

/// GET `url`, following redirects.
pub fn get(url: &str, opts: &HttpOptions) -> Result<HttpResponse, HttpError> {
    perform(url, None, opts)
}

/// POST `body` as `application/json` to `url`.
pub fn post_json(url: &str, body: &[u8], opts: &HttpOptions) -> Result<HttpResponse, HttpError> {
    perform(url, Some(body), opts)
}

fn perform(
    url: &str,
    post_body: Option<&[u8]>,
    opts: &HttpOptions,
) -> Result<HttpResponse, HttpError> {
    let mut headers: Vec<String> = Vec::new();
    let mut body: Vec<u8> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.max_redirections(MAX_REDIRECTS)?;
    easy.connect_timeout(opts.connect_timeout)?;
    easy.useragent(&opts.user_agent)?;

    let mut list = curl::easy::List::new();
    for (k, v) in &opts.headers {
        list.append(&format!("{}: {}", k.trim(), v.trim()))?;
    }
    if let Some(data) = post_body {
        easy.post(true)?;
        easy.post_fields_copy(data)?;
        list.append("Content-Type: application/json")?;
    }
    easy.http_headers(list)?;

    {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            if let Ok(s) = str::from_utf8(data) {
                let line = s.trim_end();
                if !line.is_empty() {
                    headers.push(line.to_string());
                }
            }
            true
        })?;
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }

    let status = easy.response_code()?;
    tracing::debug!(url, status, bytes = body.len(), "http request done");
    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}
