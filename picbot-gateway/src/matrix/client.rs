//! Matrix client-server API implementation over reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::sync::{self, SyncBatch, SyncResponse};
use super::{Download, MatrixError, RoomApi};

/// Direct HTTP client for a Matrix homeserver.
#[derive(Clone)]
pub struct MatrixClient {
    http_client: reqwest::Client,
    base_url: String,
    access_token: String,
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    errcode: String,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WhoamiResponse {
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    content_uri: String,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    event_id: String,
}

impl MatrixClient {
    /// Create a new client for the given homeserver.
    ///
    /// The request timeout must exceed the sync long-poll timeout, or
    /// every idle poll would surface as a network error.
    pub fn new(
        base_url: impl Into<String>,
        access_token: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to build HTTP client");

        let base_url: String = base_url.into();
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            user_id: user_id.into(),
        }
    }

    fn client_url(&self, path: &str) -> String {
        format!("{}/_matrix/client/v3{}", self.base_url, path)
    }

    /// Map non-success status codes to the error taxonomy.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, MatrixError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.json::<ApiErrorBody>().await {
            Ok(body) => body.error.unwrap_or(body.errcode),
            Err(_) => status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string(),
        };

        match status.as_u16() {
            401 | 403 => Err(MatrixError::Auth(message)),
            404 => Err(MatrixError::NotFound(message)),
            code => Err(MatrixError::Api {
                status: code,
                message,
            }),
        }
    }
}

#[async_trait]
impl RoomApi for MatrixClient {
    async fn whoami(&self) -> Result<String, MatrixError> {
        let response = self
            .http_client
            .get(self.client_url("/account/whoami"))
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let body: WhoamiResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|err| MatrixError::Decode(err.to_string()))?;
        Ok(body.user_id)
    }

    async fn sync(
        &self,
        since: Option<&str>,
        timeout: Duration,
    ) -> Result<SyncBatch, MatrixError> {
        let mut query = vec![("timeout", timeout.as_millis().to_string())];
        if let Some(since) = since {
            query.push(("since", since.to_string()));
        }

        let response = self
            .http_client
            .get(self.client_url("/sync"))
            .bearer_auth(&self.access_token)
            .query(&query)
            .send()
            .await?;

        let body: SyncResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|err| MatrixError::Decode(err.to_string()))?;
        Ok(sync::flatten(body))
    }

    async fn upload(
        &self,
        bytes: Vec<u8>,
        mime: &str,
        filename: &str,
    ) -> Result<String, MatrixError> {
        let response = self
            .http_client
            .post(format!("{}/_matrix/media/v3/upload", self.base_url))
            .bearer_auth(&self.access_token)
            .query(&[("filename", filename)])
            .header(CONTENT_TYPE, mime)
            .body(bytes)
            .send()
            .await?;

        let body: UploadResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|err| MatrixError::Decode(err.to_string()))?;
        Ok(body.content_uri)
    }

    async fn send_message(
        &self,
        room_id: &str,
        content: &Value,
    ) -> Result<String, MatrixError> {
        // Transaction IDs make retried sends idempotent on the server side.
        let txn_id = Uuid::new_v4();
        let response = self
            .http_client
            .put(self.client_url(&format!(
                "/rooms/{room_id}/send/m.room.message/{txn_id}"
            )))
            .bearer_auth(&self.access_token)
            .json(content)
            .send()
            .await?;

        let body: SendResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|err| MatrixError::Decode(err.to_string()))?;
        Ok(body.event_id)
    }

    async fn set_typing(&self, room_id: &str, typing: bool) -> Result<(), MatrixError> {
        let body = if typing {
            serde_json::json!({"typing": true, "timeout": 30_000})
        } else {
            serde_json::json!({"typing": false})
        };

        let response = self
            .http_client
            .put(self.client_url(&format!("/rooms/{room_id}/typing/{}", self.user_id)))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn fetch_event(
        &self,
        room_id: &str,
        event_id: &str,
    ) -> Result<Value, MatrixError> {
        let response = self
            .http_client
            .get(self.client_url(&format!("/rooms/{room_id}/event/{event_id}")))
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        Self::check(response)
            .await?
            .json()
            .await
            .map_err(|err| MatrixError::Decode(err.to_string()))
    }

    async fn download(&self, server: &str, media_id: &str) -> Result<Download, MatrixError> {
        let response = self
            .http_client
            .get(format!(
                "{}/_matrix/client/v1/media/download/{server}/{media_id}",
                self.base_url
            ))
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let response = Self::check(response).await?;
        let filename = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_content_disposition);
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let bytes = response.bytes().await?.to_vec();

        Ok(Download {
            bytes,
            filename,
            content_type,
        })
    }

    async fn send_receipt(&self, room_id: &str, event_id: &str) -> Result<(), MatrixError> {
        let response = self
            .http_client
            .post(self.client_url(&format!("/rooms/{room_id}/receipt/m.read/{event_id}")))
            .bearer_auth(&self.access_token)
            .json(&serde_json::json!({}))
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }
}

/// Extract the filename parameter from a Content-Disposition header.
fn filename_from_content_disposition(header: &str) -> Option<String> {
    for part in header.split(';') {
        let part = part.trim();
        if let Some(value) = part.strip_prefix("filename=") {
            let name = value.trim_matches('"').trim();
            if !name.is_empty() {
                return Some(name.to_string());
            }
        }
    }
    None
}
