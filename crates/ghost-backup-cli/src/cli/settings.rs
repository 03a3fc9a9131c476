//! Per-invocation settings resolved from flags, environment and config.

use anyhow::Result;
use ghost_backup_core::config::{self, BackupConfig, ENV_API_URL, ENV_DATE};
use ghost_backup_core::http::HttpOptions;
use ghost_backup_core::layout::BackupLayout;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RunSettings {
    pub layout: BackupLayout,
    /// Base URL without trailing slashes; `None` when not provided.
    pub api_url: Option<String>,
    pub http: HttpOptions,
    default_concurrency: usize,
}

impl RunSettings {
    /// The date tag is required; everything else has a default.
    pub fn resolve(
        output_root: Option<&Path>,
        date_tag: Option<&str>,
        api_url: Option<&str>,
        cfg: &BackupConfig,
    ) -> Result<Self> {
        let date_tag = config::require(date_tag, ENV_DATE)?;
        let output_root = output_root.unwrap_or(cfg.output_root.as_path());
        let api_url = api_url
            .map(config::normalize_base_url)
            .filter(|u| !u.is_empty());
        let http = HttpOptions {
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            user_agent: cfg.user_agent.clone(),
            headers: Vec::new(),
        };
        Ok(Self {
            layout: BackupLayout::new(output_root, &date_tag),
            api_url,
            http,
            default_concurrency: cfg.concurrency,
        })
    }

    /// API base URL, or a configuration error naming the variable.
    pub fn require_api_url(&self) -> Result<&str> {
        match self.api_url.as_deref() {
            Some(u) => Ok(u),
            None => anyhow::bail!("Missing {}", ENV_API_URL),
        }
    }

    /// Flag value if given, else the configured default.
    pub fn concurrency(&self, flag: Option<usize>) -> usize {
        flag.unwrap_or(self.default_concurrency)
    }
}
