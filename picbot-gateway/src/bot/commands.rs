//! !pic and !hello command handlers, plus the daily scheduled post.

use tracing::{debug, info, warn};

use picbot_core::RoomEvent;

use super::{Bot, BotError};
use crate::matrix::RoomApi;

impl<A: RoomApi> Bot<A> {
    /// Serve one random picture, at most once per sender per cycle.
    ///
    /// The sender is marked served before the send so a slow upload
    /// can't be raced into a second picture.
    pub(crate) async fn handle_pic(&self, event: &RoomEvent) -> Result<(), BotError> {
        let sender = &event.meta.sender;
        let exempt = self.cfg.owners_exempt && self.cfg.owners.contains(sender);

        if !exempt {
            let mut served = self.served.lock().await;
            if served.contains(sender) {
                debug!("{sender} already got a picture this cycle");
                return Ok(());
            }
            served.insert(sender);
        }

        debug!("picture for {sender}");
        let path = self.pool.pick_random()?;
        self.send_image(&event.meta.room_id, &path).await
    }

    /// Greet with the typing indicator briefly on.
    ///
    /// A failed greeting still turns the indicator back off.
    pub(crate) async fn handle_hello(&self, event: &RoomEvent) -> Result<(), BotError> {
        let room_id = &event.meta.room_id;
        self.api.set_typing(room_id, true).await?;

        let content = serde_json::json!({
            "msgtype": "m.text",
            "body": "hello",
        });
        if let Err(err) = self.api.send_message(room_id, &content).await {
            warn!("failed to send greeting: {err}");
        }

        self.api.set_typing(room_id, false).await?;
        Ok(())
    }

    /// Post the daily picture and start a new serving cycle.
    ///
    /// The served set is cleared even when the post fails, so a broken
    /// pool never freezes users out of !pic forever.
    pub async fn run_scheduled_post(&self) {
        match self.pool.pick_random() {
            Ok(path) => {
                info!("daily post: {}", path.display());
                if let Err(err) = self.send_image(&self.cfg.room_id, &path).await {
                    warn!("daily post failed: {err}");
                }
            }
            Err(err) => warn!("daily post skipped: {err}"),
        }

        self.served.lock().await.clear();
        debug!("served set cleared for the new cycle");
    }
}
