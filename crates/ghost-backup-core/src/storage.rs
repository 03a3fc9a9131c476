//! Asset file persistence.
//!
//! Bodies are written to a `.part` sibling and renamed into place, so a file at
//! the final path is always complete. The skip-on-exists check relies on that.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path (e.g. `x.png` → `x.png.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// Creates parent directories, writes `data` to the temp path, then renames it to `final_path`.
///
/// On any failure after the temp file was opened, the temp file is removed.
pub fn write_atomic(final_path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = final_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tp = temp_path(final_path);
    let res = fs::write(&tp, data).and_then(|()| fs::rename(&tp, final_path));
    if res.is_err() {
        let _ = fs::remove_file(&tp);
    }
    res
}
