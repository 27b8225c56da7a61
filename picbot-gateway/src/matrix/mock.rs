//! Recording fake homeserver for handler and session tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::sync::SyncBatch;
use super::{Download, MatrixError, RoomApi};

/// One recorded API call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Whoami,
    Sync { since: Option<String> },
    Upload { mime: String, filename: String, len: usize },
    Send { room_id: String, content: Value },
    Typing { room_id: String, typing: bool },
    Fetch { room_id: String, event_id: String },
    Download { server: String, media_id: String },
    Receipt { room_id: String, event_id: String },
}

/// RoomApi fake that records every call and replays queued responses.
///
/// Queues are consumed in order; an exhausted sync queue returns a fatal
/// error so session loops terminate, an exhausted fetch queue returns
/// NotFound.
pub struct RecordingApi {
    calls: Mutex<Vec<Call>>,
    user_id: String,
    whoami_results: Mutex<VecDeque<Result<String, MatrixError>>>,
    sync_results: Mutex<VecDeque<Result<SyncBatch, MatrixError>>>,
    fetch_results: Mutex<VecDeque<Result<Value, MatrixError>>>,
    download_result: Mutex<Option<Download>>,
    fail_next_upload: Mutex<Option<MatrixError>>,
    upload_uri: String,
}

impl RecordingApi {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            user_id: user_id.into(),
            whoami_results: Mutex::new(VecDeque::new()),
            sync_results: Mutex::new(VecDeque::new()),
            fetch_results: Mutex::new(VecDeque::new()),
            download_result: Mutex::new(None),
            fail_next_upload: Mutex::new(None),
            upload_uri: "mxc://example.org/uploaded".to_string(),
        }
    }

    pub fn push_whoami(&self, result: Result<String, MatrixError>) {
        self.whoami_results.lock().unwrap().push_back(result);
    }

    pub fn push_sync(&self, result: Result<SyncBatch, MatrixError>) {
        self.sync_results.lock().unwrap().push_back(result);
    }

    pub fn push_fetch(&self, result: Result<Value, MatrixError>) {
        self.fetch_results.lock().unwrap().push_back(result);
    }

    pub fn set_download(&self, download: Download) {
        *self.download_result.lock().unwrap() = Some(download);
    }

    pub fn fail_next_upload(&self, err: MatrixError) {
        *self.fail_next_upload.lock().unwrap() = Some(err);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// All message contents sent, with the room they went to.
    pub fn sent_messages(&self) -> Vec<(String, Value)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Send { room_id, content } => Some((room_id, content)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl RoomApi for RecordingApi {
    async fn whoami(&self) -> Result<String, MatrixError> {
        self.record(Call::Whoami);
        self.whoami_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(self.user_id.clone()))
    }

    async fn sync(
        &self,
        since: Option<&str>,
        _timeout: Duration,
    ) -> Result<SyncBatch, MatrixError> {
        self.record(Call::Sync {
            since: since.map(|s| s.to_string()),
        });
        self.sync_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(MatrixError::Auth("mock sync queue exhausted".to_string())))
    }

    async fn upload(
        &self,
        bytes: Vec<u8>,
        mime: &str,
        filename: &str,
    ) -> Result<String, MatrixError> {
        self.record(Call::Upload {
            mime: mime.to_string(),
            filename: filename.to_string(),
            len: bytes.len(),
        });
        if let Some(err) = self.fail_next_upload.lock().unwrap().take() {
            return Err(err);
        }
        Ok(self.upload_uri.clone())
    }

    async fn send_message(
        &self,
        room_id: &str,
        content: &Value,
    ) -> Result<String, MatrixError> {
        self.record(Call::Send {
            room_id: room_id.to_string(),
            content: content.clone(),
        });
        Ok(format!("$sent{}", self.calls.lock().unwrap().len()))
    }

    async fn set_typing(&self, room_id: &str, typing: bool) -> Result<(), MatrixError> {
        self.record(Call::Typing {
            room_id: room_id.to_string(),
            typing,
        });
        Ok(())
    }

    async fn fetch_event(
        &self,
        room_id: &str,
        event_id: &str,
    ) -> Result<Value, MatrixError> {
        self.record(Call::Fetch {
            room_id: room_id.to_string(),
            event_id: event_id.to_string(),
        });
        self.fetch_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(MatrixError::NotFound(event_id.to_string())))
    }

    async fn download(&self, server: &str, media_id: &str) -> Result<Download, MatrixError> {
        self.record(Call::Download {
            server: server.to_string(),
            media_id: media_id.to_string(),
        });
        Ok(self
            .download_result
            .lock()
            .unwrap()
            .clone()
            .unwrap_or(Download {
                bytes: vec![0u8; 4],
                filename: None,
                content_type: None,
            }))
    }

    async fn send_receipt(&self, room_id: &str, event_id: &str) -> Result<(), MatrixError> {
        self.record(Call::Receipt {
            room_id: room_id.to_string(),
            event_id: event_id.to_string(),
        });
        Ok(())
    }
}
