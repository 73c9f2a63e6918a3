mod config;
pub mod database;
pub mod migrations;

pub use config::{
    Backend, Config, HostedConfig, LoggingConfig, StoreConfig, StreakConfig, CONFIG_FILE,
    HOSTED_ANON_KEY_ENV, HOSTED_URL_ENV,
};
pub use database::{Database, DATABASE_FILE, DEFAULT_BUSY_TIMEOUT};

use std::path::PathBuf;

/// Overrides the data directory entirely.
pub const HOME_ENV: &str = "STREAKBOOK_HOME";

/// Returns `~/.config/streakbook[-dev]/` based on STREAKBOOK_ENV.
///
/// Set STREAKBOOK_ENV=dev to use development data directory, or
/// STREAKBOOK_HOME to use an arbitrary directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let dir = match std::env::var_os(HOME_ENV) {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env =
                std::env::var("STREAKBOOK_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("streakbook-dev")
            } else {
                base_dir.join("streakbook")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
