//! Event handling for the picture bot.
//!
//! [`Bot`] owns the per-cycle served set and the media pool, and turns
//! classified room events into homeserver calls. Handler failures are
//! contained per event; one failing command never takes the session
//! loop down.

mod commands;
mod harvest;
mod send;

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, trace, warn};

use picbot_core::{Command, MediaError, MediaPool, Route, RoomEvent, ServedSet, route};

use crate::matrix::{MatrixError, RoomApi};

/// Room-facing bot configuration, derived from the loaded config.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// The bot's own user ID, for self-event filtering
    pub user_id: String,
    /// Room the daily post goes to
    pub room_id: String,
    /// Users allowed to harvest images
    pub owners: HashSet<String>,
    /// Reaction key that triggers harvesting
    pub approve_key: String,
    /// Whether owners bypass the once-per-cycle limit
    pub owners_exempt: bool,
}

/// Errors from bot handlers
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("Matrix error: {0}")]
    Matrix(#[from] MatrixError),

    #[error("Media pool error: {0}")]
    Media(#[from] MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// The bot itself: one per process, shared by session loop and scheduler.
pub struct Bot<A: RoomApi> {
    api: Arc<A>,
    cfg: BotConfig,
    pool: MediaPool,
    served: Mutex<ServedSet>,
}

impl<A: RoomApi> Bot<A> {
    pub fn new(api: Arc<A>, cfg: BotConfig, pool: MediaPool) -> Self {
        Self {
            api,
            cfg,
            pool,
            served: Mutex::new(ServedSet::new()),
        }
    }

    /// Handle one timeline event.
    ///
    /// Message events are acknowledged with a read receipt before any
    /// filtering, so the room stays marked read even for events the bot
    /// ignores.
    pub async fn handle_event(&self, event: &RoomEvent, is_backlog: bool) {
        if event.is_message() {
            if let Err(err) = self
                .api
                .send_receipt(&event.meta.room_id, &event.meta.event_id)
                .await
            {
                debug!("failed to send read receipt: {err}");
            }
        }

        match route(event, is_backlog, &self.cfg.user_id, &self.cfg.approve_key) {
            Route::Command(Command::Pic) => {
                if let Err(err) = self.handle_pic(event).await {
                    warn!("!pic from {} failed: {err}", event.meta.sender);
                }
            }
            Route::Command(Command::Hello) => {
                if let Err(err) = self.handle_hello(event).await {
                    warn!("!hello from {} failed: {err}", event.meta.sender);
                }
            }
            Route::Command(Command::Unrecognized(word)) => {
                debug!("unrecognized command !{word} from {}", event.meta.sender);
            }
            Route::ImageSeen => {
                debug!("image received in room {}", event.meta.room_id);
            }
            Route::Harvest { target } => {
                if let Err(err) = self.handle_harvest(event, &target).await {
                    warn!("harvest of {target} failed: {err}");
                }
            }
            Route::Ignore(reason) => {
                trace!("ignoring event {}: {reason:?}", event.meta.event_id);
            }
        }
    }
}
