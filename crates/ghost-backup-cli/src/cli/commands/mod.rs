//! CLI command handlers. Each command is in its own file.

mod assets;
mod backup;
mod export;

pub use assets::run_assets;
pub use backup::run_backup;
pub use export::run_export;
