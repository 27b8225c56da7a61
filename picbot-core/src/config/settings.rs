//! Settings configuration loaded from TOML files.
//!
//! This module handles non-sensitive configuration stored in TOML format
//! in the XDG config directory (~/.config/picbot/config.toml).

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default TOML configuration file content
const DEFAULT_CONFIG_TOML: &str = r#"# picbot configuration file
# Located at: ~/.config/picbot/config.toml
#
# This file contains non-sensitive configuration.
# Secrets are loaded from environment variables:
#   - PICBOT_ACCESS_TOKEN

# Homeserver base URL, e.g. "https://matrix.example.org"
homeserver = ""

# Full Matrix user ID of the bot account, e.g. "@picbot:example.org"
user_id = ""

# Room where the daily picture is posted, e.g. "!abcdef:example.org"
room_id = ""

# User IDs allowed to trigger harvesting (and !pic, if owners_exempt is off)
owners = []

# Directory the picture collection lives in
media_dir = ""

# post_time = "13:37"   # UTC
# approve_key = "👍️"
# owners_exempt = true

[logging]
level = "info"
"#;

/// Settings loaded from TOML configuration file.
///
/// These are non-sensitive configuration values that can be safely
/// stored in files and version controlled (excluding secrets).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    /// Homeserver base URL (http or https)
    #[serde(default)]
    pub homeserver: String,

    /// Full Matrix user ID of the bot account
    #[serde(default)]
    pub user_id: String,

    /// Room the daily post goes to
    #[serde(default)]
    pub room_id: String,

    /// User IDs allowed to harvest images
    #[serde(default)]
    pub owners: Vec<String>,

    /// Directory holding the picture collection
    #[serde(default)]
    pub media_dir: String,

    /// Time of the daily post, "HH:MM", interpreted as UTC
    #[serde(default = "default_post_time")]
    pub post_time: String,

    /// Reaction key that triggers harvesting
    #[serde(default = "default_approve_key")]
    pub approve_key: String,

    /// Whether owner commands bypass the once-per-cycle limit
    #[serde(default = "default_owners_exempt")]
    pub owners_exempt: bool,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Logging settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingSettings {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions

fn default_post_time() -> String {
    "13:37".to_string()
}

fn default_approve_key() -> String {
    "👍️".to_string()
}

fn default_owners_exempt() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            homeserver: String::new(),
            user_id: String::new(),
            room_id: String::new(),
            owners: Vec::new(),
            media_dir: String::new(),
            post_time: default_post_time(),
            approve_key: default_approve_key(),
            owners_exempt: default_owners_exempt(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Errors that can occur when loading settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config directory not found")]
    ConfigDirNotFound,
}

impl Settings {
    /// Load settings from the TOML configuration file.
    ///
    /// If the config file doesn't exist, creates it with default values.
    /// The file is located at `~/.config/picbot/config.toml`.
    pub fn load() -> Result<Self, SettingsError> {
        let config_path = Self::config_path()?;

        // Create default config if it doesn't exist
        if !config_path.exists() {
            tracing::info!("Creating default configuration at {:?}", config_path);
            Self::create_default_config(&config_path)?;
        }

        // Read and parse the TOML file
        let content = fs::read_to_string(&config_path)?;
        Self::from_toml(&content)
    }

    /// Parse settings from TOML content.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(content)?;
        Ok(settings)
    }

    /// Serialize settings to TOML content.
    pub fn to_toml(&self) -> Result<String, SettingsError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Get the configuration file path.
    ///
    /// Uses XDG config directory: `~/.config/picbot/config.toml`
    pub fn config_path() -> Result<PathBuf, SettingsError> {
        if let Ok(override_dir) = std::env::var("PICBOT_CONFIG_DIR") {
            let dir = PathBuf::from(override_dir);
            return Ok(dir.join("config.toml"));
        }

        let config_dir = dirs::config_dir()
            .ok_or(SettingsError::ConfigDirNotFound)?
            .join("picbot");

        Ok(config_dir.join("config.toml"))
    }

    /// Create the default configuration file.
    fn create_default_config(path: &PathBuf) -> Result<(), SettingsError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write default TOML config
        fs::write(path, DEFAULT_CONFIG_TOML)?;

        Ok(())
    }

    /// Save settings to a specific file path.
    pub fn save_to_path(&self, path: &PathBuf) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = self.to_toml()?;
        fs::write(path, content)?;
        Ok(())
    }
}

/// Parse a "HH:MM" post time into (hour, minute).
pub fn parse_post_time(s: &str) -> Option<(u32, u32)> {
    let (h, m) = s.split_once(':')?;
    let hour: u32 = h.parse().ok()?;
    let minute: u32 = m.parse().ok()?;
    if hour < 24 && minute < 60 {
        Some((hour, minute))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();

        assert!(settings.homeserver.is_empty());
        assert!(settings.user_id.is_empty());
        assert!(settings.room_id.is_empty());
        assert!(settings.owners.is_empty());
        assert!(settings.media_dir.is_empty());
        assert_eq!(settings.post_time, "13:37");
        assert_eq!(settings.approve_key, "👍️");
        assert!(settings.owners_exempt);
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_from_toml() {
        let toml = r#"
homeserver = "https://matrix.example.org"
user_id = "@picbot:example.org"
room_id = "!room:example.org"
owners = ["@alice:example.org", "@bob:example.org"]
media_dir = "/srv/picbot/pics"
post_time = "09:30"
approve_key = "✅"
owners_exempt = false

[logging]
level = "debug"
"#;

        let settings = Settings::from_toml(toml).unwrap();

        assert_eq!(settings.homeserver, "https://matrix.example.org");
        assert_eq!(settings.user_id, "@picbot:example.org");
        assert_eq!(settings.room_id, "!room:example.org");
        assert_eq!(settings.owners.len(), 2);
        assert_eq!(settings.media_dir, "/srv/picbot/pics");
        assert_eq!(settings.post_time, "09:30");
        assert_eq!(settings.approve_key, "✅");
        assert!(!settings.owners_exempt);
        assert_eq!(settings.logging.level, "debug");
    }

    #[test]
    fn test_from_toml_partial() {
        // Test that partial config fills in defaults
        let toml = r#"
homeserver = "https://matrix.example.org"
"#;

        let settings = Settings::from_toml(toml).unwrap();

        assert_eq!(settings.homeserver, "https://matrix.example.org");
        assert_eq!(settings.post_time, "13:37");
        assert!(settings.owners_exempt);
    }

    #[test]
    fn test_default_config_template_parses() {
        let settings = Settings::from_toml(DEFAULT_CONFIG_TOML).unwrap();
        assert!(settings.homeserver.is_empty());
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.homeserver = "https://matrix.example.org".to_string();
        settings.owners = vec!["@alice:example.org".to_string()];
        settings.post_time = "18:00".to_string();

        settings.save_to_path(&path).expect("save failed");

        let content = fs::read_to_string(&path).expect("read failed");
        let loaded = Settings::from_toml(&content).expect("parse failed");

        assert_eq!(loaded.homeserver, "https://matrix.example.org");
        assert_eq!(loaded.owners, vec!["@alice:example.org".to_string()]);
        assert_eq!(loaded.post_time, "18:00");
    }

    #[test]
    fn test_config_path_uses_env_override() {
        let dir = tempfile::tempdir().unwrap();
        let value = dir.path().to_string_lossy().to_string();

        // SAFETY: test-scoped env mutation.
        unsafe { std::env::set_var("PICBOT_CONFIG_DIR", &value) };
        let path = Settings::config_path().unwrap();
        // SAFETY: test-scoped env mutation cleanup.
        unsafe { std::env::remove_var("PICBOT_CONFIG_DIR") };

        assert_eq!(path, dir.path().join("config.toml"));
    }

    #[test]
    fn test_parse_post_time() {
        assert_eq!(parse_post_time("13:37"), Some((13, 37)));
        assert_eq!(parse_post_time("00:00"), Some((0, 0)));
        assert_eq!(parse_post_time("23:59"), Some((23, 59)));
        assert_eq!(parse_post_time("24:00"), None);
        assert_eq!(parse_post_time("12:60"), None);
        assert_eq!(parse_post_time("noon"), None);
        assert_eq!(parse_post_time("12"), None);
    }
}
