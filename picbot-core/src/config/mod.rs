//! Configuration management for picbot.
//!
//! This module provides a unified configuration system that separates
//! secrets (from environment variables) from settings (from TOML files).
//!
//! # Configuration Sources
//!
//! ## Secrets (Environment Variables)
//! - `PICBOT_ACCESS_TOKEN` - Matrix access token
//!
//! ## Settings (TOML File)
//! Located at `~/.config/picbot/config.toml`:
//! ```toml
//! homeserver = "https://matrix.example.org"
//! user_id = "@picbot:example.org"
//! room_id = "!room:example.org"
//! owners = ["@alice:example.org"]
//! media_dir = "/srv/picbot/pics"
//! post_time = "13:37"
//!
//! [logging]
//! level = "info"
//! ```

mod secrets;
mod settings;

use std::collections::HashSet;

pub use secrets::{Secrets, SecretsError};
pub use settings::{LoggingSettings, Settings, SettingsError, parse_post_time};

/// Combined configuration containing both secrets and settings.
///
/// This is the main configuration type used throughout the application.
/// It separates sensitive secrets (from env) from non-sensitive settings (from TOML).
#[derive(Debug, Clone)]
pub struct Config {
    /// Secrets loaded from environment variables
    pub secrets: Secrets,
    /// Settings loaded from TOML configuration file
    pub settings: Settings,
}

/// Errors that can occur when loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Secrets error: {0}")]
    Secrets(#[from] SecretsError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Invalid homeserver URL '{0}': must start with http:// or https://")]
    InvalidHomeserver(String),

    #[error("Invalid user ID '{0}': must start with '@'")]
    InvalidUserId(String),

    #[error("Invalid room ID '{0}': must start with '!'")]
    InvalidRoomId(String),

    #[error("Invalid post time '{0}': expected HH:MM")]
    InvalidPostTime(String),

    #[error("media_dir is not set")]
    MediaDirNotSet,
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// This loads:
    /// 1. Secrets from environment variables
    /// 2. Settings from TOML file (creating defaults if needed)
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The access token is missing
    /// - The TOML file cannot be read or parsed
    /// - Any required setting is missing or malformed
    pub fn load() -> Result<Self, ConfigError> {
        let secrets = Secrets::from_env()?;
        let settings = Settings::load()?;

        Self::from_parts(secrets, settings)
    }

    /// Validate and assemble a configuration from already-loaded parts.
    pub fn from_parts(secrets: Secrets, settings: Settings) -> Result<Self, ConfigError> {
        if !settings.homeserver.starts_with("http://")
            && !settings.homeserver.starts_with("https://")
        {
            return Err(ConfigError::InvalidHomeserver(settings.homeserver.clone()));
        }

        if !settings.user_id.starts_with('@') {
            return Err(ConfigError::InvalidUserId(settings.user_id.clone()));
        }

        if !settings.room_id.starts_with('!') {
            return Err(ConfigError::InvalidRoomId(settings.room_id.clone()));
        }

        if parse_post_time(&settings.post_time).is_none() {
            return Err(ConfigError::InvalidPostTime(settings.post_time.clone()));
        }

        if settings.media_dir.trim().is_empty() {
            return Err(ConfigError::MediaDirNotSet);
        }

        Ok(Self { secrets, settings })
    }

    /// Owner user IDs as a set for membership checks.
    pub fn owners(&self) -> HashSet<String> {
        self.settings.owners.iter().cloned().collect()
    }

    /// The daily post time as (hour, minute).
    pub fn post_time(&self) -> (u32, u32) {
        parse_post_time(&self.settings.post_time)
            .expect("post time must be valid after validation")
    }
}

/// Load .env file if it exists (for development convenience).
///
/// This is called automatically by `Config::load()` but is also
/// exported for use in other contexts.
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}
