//! Configuration: optional `config.toml` plus values resolved from flags and
//! environment (API base URL, date tag, admin credentials).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default number of concurrent asset downloads.
pub const DEFAULT_CONCURRENCY: usize = 6;

pub const ENV_API_URL: &str = "GHOST_ADMIN_API_URL";
pub const ENV_DATE: &str = "BACKUP_DATE";
pub const ENV_USERNAME: &str = "GHOST_USERNAME";
pub const ENV_PASSWORD: &str = "GHOST_PASSWORD";

/// Global configuration loaded from `~/.config/ghost-backup/config.toml` (all keys optional).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    /// Root under which `<date-tag>/` run directories are created.
    pub output_root: PathBuf,
    /// Maximum number of asset downloads in flight.
    pub concurrency: usize,
    /// TCP/TLS connect timeout in seconds for every request.
    pub connect_timeout_secs: u64,
    /// User-Agent sent with every request.
    pub user_agent: String,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("output"),
            concurrency: DEFAULT_CONCURRENCY,
            connect_timeout_secs: 30,
            user_agent: format!("ghost-backup/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Existing `config.toml` in the XDG config dirs, if any.
pub fn config_path() -> Result<Option<PathBuf>> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("ghost-backup")?;
    Ok(xdg_dirs.find_config_file("config.toml"))
}

/// Load configuration.
///
/// An explicit path must exist. Without one, the XDG config file is used when
/// present and built-in defaults otherwise.
pub fn load(explicit: Option<&Path>) -> Result<BackupConfig> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => match config_path() {
            Ok(Some(p)) => p,
            _ => return Ok(BackupConfig::default()),
        },
    };
    let data = fs::read_to_string(&path)
        .with_context(|| format!("read config {}", path.display()))?;
    let cfg: BackupConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    tracing::debug!("loaded config from {}", path.display());
    Ok(cfg)
}

/// Strips trailing slashes so paths can be appended with a leading `/`.
pub fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

/// Returns the trimmed value, or a configuration error naming `var`.
pub fn require(value: Option<&str>, var: &str) -> Result<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => anyhow::bail!("Missing {}", var),
    }
}

/// Admin username/password for session authentication.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Both values are required; the error lists whichever are missing.
    pub fn resolve(username: Option<&str>, password: Option<&str>) -> Result<Self> {
        let mut missing = Vec::new();
        if username.map_or(true, |s| s.trim().is_empty()) {
            missing.push(ENV_USERNAME);
        }
        if password.map_or(true, |s| s.is_empty()) {
            missing.push(ENV_PASSWORD);
        }
        if !missing.is_empty() {
            anyhow::bail!("Missing {}", missing.join(", "));
        }
        Ok(Self {
            username: username.unwrap_or_default().trim().to_string(),
            password: password.unwrap_or_default().to_string(),
        })
    }
}
