//! On-disk layout of one backup run.
//!
//! The export stage writes `export_path`; the asset stage reads it and mirrors
//! images under `assets_root`. Nothing else is shared between the two.

use std::path::{Path, PathBuf};

/// Directory name for mirrored images inside a run directory.
pub const ASSETS_DIR: &str = "assets";

/// Paths for a single run identified by its date tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupLayout {
    pub date_tag: String,
    pub day_dir: PathBuf,
    pub export_path: PathBuf,
    pub assets_root: PathBuf,
}

impl BackupLayout {
    /// `<output_root>/<date_tag>/ghost-export-<date_tag>.json` and `<output_root>/<date_tag>/assets`.
    /// The date tag is used verbatim.
    pub fn new(output_root: &Path, date_tag: &str) -> Self {
        let day_dir = output_root.join(date_tag);
        Self {
            date_tag: date_tag.to_string(),
            export_path: day_dir.join(export_file_name(date_tag)),
            assets_root: day_dir.join(ASSETS_DIR),
            day_dir,
        }
    }
}

pub fn export_file_name(date_tag: &str) -> String {
    format!("ghost-export-{}.json", date_tag)
}
