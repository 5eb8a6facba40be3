mod config;
pub mod database;

pub use config::Config;
pub use database::{Database, LogEffect};

use std::io;
use std::path::PathBuf;

/// Returns `~/.config/worklog[-dev]/` based on WORKLOG_ENV.
///
/// Set WORKLOG_ENV=dev to keep development data away from the real
/// data directory.
pub fn data_dir() -> io::Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("WORKLOG_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("worklog-dev")
    } else {
        base_dir.join("worklog")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
