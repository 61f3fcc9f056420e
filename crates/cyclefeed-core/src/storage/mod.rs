mod config;
pub mod database;

pub use config::{Config, DatabaseConfig, FeedConfig, ViewerConfig};
pub use database::{Database, SqliteItemSource};

use std::path::PathBuf;

/// Returns the data directory, creating it if needed.
///
/// `CYCLEFEED_DATA_DIR` wins when set; otherwise `~/.config/cyclefeed/`,
/// or `~/.config/cyclefeed-dev/` when `CYCLEFEED_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let dir = match std::env::var_os("CYCLEFEED_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("CYCLEFEED_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("cyclefeed-dev")
            } else {
                base_dir.join("cyclefeed")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
