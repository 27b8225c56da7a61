//! Matrix client-server API access.
//!
//! The bot talks to the homeserver through the [`RoomApi`] trait so that
//! handlers can be tested against a recording fake instead of a live server.

pub mod client;
pub mod sync;

#[cfg(test)]
pub(crate) mod mock;

use std::time::Duration;

use async_trait::async_trait;

pub use client::MatrixClient;
pub use sync::SyncBatch;

/// A media download, with the filename the server suggested (if any).
#[derive(Debug, Clone)]
pub struct Download {
    pub bytes: Vec<u8>,
    pub filename: Option<String>,
    pub content_type: Option<String>,
}

/// Errors that can occur when calling the homeserver
#[derive(Debug, thiserror::Error)]
pub enum MatrixError {
    #[error("HTTP request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Authentication rejected: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl MatrixError {
    /// Whether the session loop should retry after this error.
    ///
    /// Network failures, malformed responses and server-side errors are
    /// retried. Authentication and other client errors are fatal.
    pub fn is_transient(&self) -> bool {
        match self {
            MatrixError::Network(_) | MatrixError::Decode(_) => true,
            MatrixError::Api { status, .. } => *status >= 500,
            MatrixError::Auth(_) | MatrixError::NotFound(_) => false,
        }
    }
}

/// Operations the bot needs from a Matrix homeserver.
#[async_trait]
pub trait RoomApi: Send + Sync {
    /// Resolve the user ID the access token belongs to.
    async fn whoami(&self) -> Result<String, MatrixError>;

    /// Long-poll for new events since the given batch token.
    async fn sync(&self, since: Option<&str>, timeout: Duration)
    -> Result<SyncBatch, MatrixError>;

    /// Upload media, returning its mxc:// URI.
    async fn upload(
        &self,
        bytes: Vec<u8>,
        mime: &str,
        filename: &str,
    ) -> Result<String, MatrixError>;

    /// Send an m.room.message event, returning its event ID.
    async fn send_message(
        &self,
        room_id: &str,
        content: &serde_json::Value,
    ) -> Result<String, MatrixError>;

    /// Turn the typing indicator on or off.
    async fn set_typing(&self, room_id: &str, typing: bool) -> Result<(), MatrixError>;

    /// Fetch a single event by ID.
    async fn fetch_event(
        &self,
        room_id: &str,
        event_id: &str,
    ) -> Result<serde_json::Value, MatrixError>;

    /// Download media from the homeserver.
    async fn download(&self, server: &str, media_id: &str) -> Result<Download, MatrixError>;

    /// Mark an event as read.
    async fn send_receipt(&self, room_id: &str, event_id: &str) -> Result<(), MatrixError>;
}
