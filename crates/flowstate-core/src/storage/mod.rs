mod config;
pub mod settings;

pub use config::{ApiConfig, Config, MusicConfig, NotificationsConfig, Theme, TimerConfig, UiConfig};
pub use settings::{ConfigFileSettings, SettingsSource, SharedSettings, TimerSettings};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the Flowstate data directory, creating it if needed.
///
/// `FLOWSTATE_CONFIG_DIR` wins when set. Otherwise `~/.config/flowstate`, or
/// `~/.config/flowstate-dev` when `FLOWSTATE_ENV=dev`.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("FLOWSTATE_CONFIG_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("FLOWSTATE_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("flowstate-dev")
            } else {
                base_dir.join("flowstate")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|source| ConfigError::DataDir {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}
