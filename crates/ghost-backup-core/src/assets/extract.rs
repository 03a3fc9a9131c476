//! Local-image reference matching and URL normalization.

use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;

use super::walker::walk_strings;

/// Path segment identifying images hosted by the blog itself.
pub const LOCAL_IMAGE_MARKER: &str = "/content/images/";

/// Characters that end a reference inside HTML or text: quotes, whitespace, `)` and angle brackets.
const STOP: &str = r#""'\s)<>"#;

/// Deduplicated absolute URLs in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct CandidateUrls {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl CandidateUrls {
    /// Adds `url` unless an identical string is already present. Returns true if added.
    pub fn insert(&mut self, url: String) -> bool {
        if self.seen.contains(&url) {
            return false;
        }
        self.seen.insert(url.clone());
        self.order.push(url);
        true
    }

    pub fn contains(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

/// Turns a matched reference into an absolute URL.
///
/// 1. `http://` / `https://` → unchanged
/// 2. `//host/path` → `https:` prefix
/// 3. `/path` → `base_url` prefix (discarded when no base URL is configured)
/// 4. anything else → `None`
///
/// The result must also parse as a URL.
pub fn normalize_to_absolute(candidate: &str, base_url: Option<&str>) -> Option<String> {
    let abs = if candidate.starts_with("http://") || candidate.starts_with("https://") {
        candidate.to_string()
    } else if candidate.starts_with("//") {
        format!("https:{}", candidate)
    } else if candidate.starts_with('/') {
        let base = base_url.filter(|b| !b.is_empty())?;
        format!("{}{}", base, candidate)
    } else {
        return None;
    };
    url::Url::parse(&abs).ok()?;
    Some(abs)
}

/// Offset of the second marker occurrence inside `hit`, if there is one.
fn next_marker_offset(hit: &str) -> Option<usize> {
    let own = hit.find(LOCAL_IMAGE_MARKER)?;
    let next = hit[own + 1..].find(LOCAL_IMAGE_MARKER)?;
    Some(own + 1 + next)
}

/// Finds local-image references in strings and normalizes them against the API base URL.
#[derive(Debug, Clone)]
pub struct Extractor {
    base_url: Option<String>,
    pattern: Regex,
}

impl Extractor {
    /// `base_url` should already have trailing slashes stripped.
    pub fn new(base_url: Option<&str>) -> Result<Self, regex::Error> {
        // Optional scheme+host (or protocol-relative host), then the marker and the rest of the path.
        let pattern = Regex::new(&format!(
            r#"(?:(?:https?:)?//[^{stop}]+?)?{marker}[^{stop}]+"#,
            stop = STOP,
            marker = regex::escape(LOCAL_IMAGE_MARKER),
        ))?;
        Ok(Self {
            base_url: base_url.filter(|b| !b.is_empty()).map(str::to_string),
            pattern,
        })
    }

    /// Raw references inside `s`, one per marker occurrence, before normalization.
    ///
    /// A match that runs into a second marker is cut there (dropping a trailing `,` or `;`)
    /// and the scan resumes at that marker. A `//host` match preceded by another
    /// scheme (`ftp://`) is dropped whole.
    pub fn references_in<'s>(&'s self, s: &'s str) -> impl Iterator<Item = &'s str> + 's {
        let mut pos = if s.contains(LOCAL_IMAGE_MARKER) { 0 } else { s.len() };
        std::iter::from_fn(move || loop {
            let m = self.pattern.find_at(s, pos)?;
            let (hit, end) = match next_marker_offset(m.as_str()) {
                Some(off) => {
                    let cut = &s[m.start()..m.start() + off];
                    (cut.trim_end_matches([',', ';']), m.start() + off)
                }
                None => (m.as_str(), m.end()),
            };
            pos = end;
            if hit.starts_with("//") && s[..m.start()].ends_with(':') {
                tracing::debug!(reference = hit, "discarding image reference with foreign scheme");
                continue;
            }
            return Some(hit);
        })
    }

    /// Normalized absolute URLs for every reference inside `s` (not deduplicated).
    pub fn urls_in<'s>(&'s self, s: &'s str) -> impl Iterator<Item = String> + 's {
        self.references_in(s).filter_map(move |r| {
            let url = normalize_to_absolute(r, self.base_url.as_deref());
            if url.is_none() {
                tracing::debug!(reference = r, "discarding unresolvable image reference");
            }
            url
        })
    }

    /// Walks the whole export and collects the Candidate URL Set.
    pub fn extract(&self, export: &Value) -> CandidateUrls {
        let mut urls = CandidateUrls::default();
        for s in walk_strings(export) {
            for url in self.urls_in(s) {
                urls.insert(url);
            }
        }
        urls
    }
}
