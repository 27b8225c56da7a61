//! The resilient sync loop.
//!
//! One long-poll at a time, fixed-delay retry on transient failures,
//! immediate exit on fatal ones. The first successful batch after
//! startup is backlog: its events are classified but never acted on,
//! so commands sent while the bot was down don't fire on restart.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::bot::Bot;
use crate::matrix::{MatrixError, RoomApi};

/// Sync long-poll duration. Must stay below the HTTP client timeout.
const POLL_TIMEOUT: Duration = Duration::from_secs(30);

/// Fixed delay before retrying after a transient failure.
const RETRY_DELAY: Duration = Duration::from_secs(15);

pub struct SessionEngine<A: RoomApi> {
    api: Arc<A>,
    bot: Arc<Bot<A>>,
    poll_timeout: Duration,
    retry_delay: Duration,
}

impl<A: RoomApi> SessionEngine<A> {
    pub fn new(api: Arc<A>, bot: Arc<Bot<A>>) -> Self {
        Self {
            api,
            bot,
            poll_timeout: POLL_TIMEOUT,
            retry_delay: RETRY_DELAY,
        }
    }

    #[cfg(test)]
    fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Verify the token, then sync until a fatal error.
    pub async fn run(&self) -> Result<(), MatrixError> {
        let user_id = self.whoami_with_retry().await?;
        info!("connected as {user_id}");

        let mut since: Option<String> = None;
        let mut first_batch = true;

        loop {
            match self.api.sync(since.as_deref(), self.poll_timeout).await {
                Ok(batch) => {
                    let is_backlog = first_batch;
                    first_batch = false;
                    // Cursor advances even when handlers fail, so one bad
                    // event is never replayed forever.
                    since = Some(batch.next_batch.clone());
                    if is_backlog && !batch.events.is_empty() {
                        info!("skipping {} backlog events", batch.events.len());
                    }
                    for event in &batch.events {
                        self.bot.handle_event(event, is_backlog).await;
                    }
                }
                Err(err) if err.is_transient() => {
                    warn!(
                        "sync failed, retrying in {}s: {err}",
                        self.retry_delay.as_secs()
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(err) => {
                    error!("sync failed fatally: {err}");
                    return Err(err);
                }
            }
        }
    }

    async fn whoami_with_retry(&self) -> Result<String, MatrixError> {
        loop {
            match self.api.whoami().await {
                Ok(user_id) => return Ok(user_id),
                Err(err) if err.is_transient() => {
                    warn!(
                        "whoami failed, retrying in {}s: {err}",
                        self.retry_delay.as_secs()
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(err) => {
                    error!("credential check failed: {err}");
                    return Err(err);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use tempfile::TempDir;

    use picbot_core::{EventContent, EventMeta, MediaPool, RoomEvent};

    use crate::bot::BotConfig;
    use crate::matrix::SyncBatch;
    use crate::matrix::mock::{Call, RecordingApi};

    const BOT: &str = "@picbot:example.org";
    const ROOM: &str = "!room:example.org";

    fn transient() -> MatrixError {
        MatrixError::Api {
            status: 503,
            message: "unavailable".to_string(),
        }
    }

    fn hello_batch(next_batch: &str) -> SyncBatch {
        SyncBatch {
            next_batch: next_batch.to_string(),
            events: vec![RoomEvent {
                meta: EventMeta {
                    room_id: ROOM.to_string(),
                    sender: "@alice:example.org".to_string(),
                    event_id: "$hello".to_string(),
                    origin_ts: 0,
                },
                content: EventContent::Text {
                    body: "!hello".to_string(),
                },
            }],
        }
    }

    fn engine(api: Arc<RecordingApi>, dir: &TempDir) -> SessionEngine<RecordingApi> {
        let cfg = BotConfig {
            user_id: BOT.to_string(),
            room_id: ROOM.to_string(),
            owners: HashSet::new(),
            approve_key: "👍️".to_string(),
            owners_exempt: true,
        };
        let bot = Arc::new(Bot::new(Arc::clone(&api), cfg, MediaPool::new(dir.path())));
        SessionEngine::new(api, bot).with_retry_delay(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_transient_failures_retried_then_fatal_exits() {
        let dir = TempDir::new().unwrap();
        let api = Arc::new(RecordingApi::new(BOT));
        api.push_whoami(Err(transient()));
        api.push_sync(Err(transient()));
        api.push_sync(Err(transient()));
        api.push_sync(Ok(SyncBatch {
            next_batch: "s1".to_string(),
            events: vec![],
        }));
        api.push_sync(Ok(hello_batch("s2")));
        api.push_sync(Err(MatrixError::Auth("token revoked".to_string())));

        let result = engine(Arc::clone(&api), &dir).run().await;
        assert!(matches!(result, Err(MatrixError::Auth(_))));

        // Two whoami attempts, five syncs, greeting sent once.
        let calls = api.calls();
        assert_eq!(
            calls.iter().filter(|c| matches!(c, Call::Whoami)).count(),
            2
        );
        assert_eq!(
            calls.iter().filter(|c| matches!(c, Call::Sync { .. })).count(),
            5
        );
        assert_eq!(api.sent_messages().len(), 1);
    }

    #[tokio::test]
    async fn test_cursor_advances_across_polls() {
        let dir = TempDir::new().unwrap();
        let api = Arc::new(RecordingApi::new(BOT));
        api.push_sync(Ok(SyncBatch {
            next_batch: "s1".to_string(),
            events: vec![],
        }));
        api.push_sync(Ok(SyncBatch {
            next_batch: "s2".to_string(),
            events: vec![],
        }));

        let _ = engine(Arc::clone(&api), &dir).run().await;

        let sinces: Vec<Option<String>> = api
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Sync { since } => Some(since),
                _ => None,
            })
            .collect();
        assert_eq!(
            sinces,
            vec![None, Some("s1".to_string()), Some("s2".to_string())]
        );
    }

    #[tokio::test]
    async fn test_first_batch_is_backlog() {
        let dir = TempDir::new().unwrap();
        let api = Arc::new(RecordingApi::new(BOT));
        // The same !hello arrives in the first batch and the second; only
        // the second may be acted on.
        api.push_sync(Ok(hello_batch("s1")));
        api.push_sync(Ok(hello_batch("s2")));

        let _ = engine(Arc::clone(&api), &dir).run().await;

        assert_eq!(api.sent_messages().len(), 1);
    }

    #[tokio::test]
    async fn test_fatal_whoami_exits_without_sync() {
        let dir = TempDir::new().unwrap();
        let api = Arc::new(RecordingApi::new(BOT));
        api.push_whoami(Err(MatrixError::Auth("bad token".to_string())));

        let result = engine(Arc::clone(&api), &dir).run().await;

        assert!(matches!(result, Err(MatrixError::Auth(_))));
        assert!(
            api.calls()
                .iter()
                .all(|c| !matches!(c, Call::Sync { .. }))
        );
    }
}
