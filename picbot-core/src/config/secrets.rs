//! Secrets configuration loaded from environment variables only.
//!
//! The access token is the only credential the bot holds. It is never
//! read from or written to the settings file.

use std::env;

/// Secrets loaded exclusively from environment variables.
#[derive(Debug, Clone, Default)]
pub struct Secrets {
    /// Matrix access token (env: PICBOT_ACCESS_TOKEN)
    pub access_token: String,
}

/// Errors that can occur when loading secrets
#[derive(Debug, thiserror::Error)]
pub enum SecretsError {
    #[error("No access token configured. Set PICBOT_ACCESS_TOKEN")]
    MissingAccessToken,
}

impl Secrets {
    /// Load secrets from environment variables.
    ///
    /// Also loads a `.env` file if present (development convenience);
    /// production should rely on actual environment variables.
    pub fn from_env() -> Result<Self, SecretsError> {
        let _ = dotenvy::dotenv();

        Self::from_env_inner()
    }

    /// Internal method to load from environment without loading .env
    pub(crate) fn from_env_inner() -> Result<Self, SecretsError> {
        let access_token = env::var("PICBOT_ACCESS_TOKEN")
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(SecretsError::MissingAccessToken)?;

        Ok(Self { access_token })
    }
}
