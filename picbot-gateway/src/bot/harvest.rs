//! Reaction-driven harvesting of approved images into the pool.

use tracing::{debug, info, warn};
use url::Url;

use picbot_core::RoomEvent;

use super::{Bot, BotError};
use crate::matrix::RoomApi;

impl<A: RoomApi> Bot<A> {
    /// Download the image an owner approved and add it to the pool.
    ///
    /// Every precondition failure aborts silently (debug log only);
    /// only a stored image earns the confirmation reply.
    pub(crate) async fn handle_harvest(
        &self,
        event: &RoomEvent,
        target: &str,
    ) -> Result<(), BotError> {
        let sender = &event.meta.sender;
        if !self.cfg.owners.contains(sender) {
            debug!("ignoring approval from non-owner {sender}");
            return Ok(());
        }

        let room_id = &event.meta.room_id;
        let original = self.api.fetch_event(room_id, target).await?;

        if original["type"] != "m.room.message"
            || original["content"]["msgtype"] != "m.image"
        {
            debug!("approved event {target} is not an image message");
            return Ok(());
        }
        let Some(mxc) = original["content"]["url"].as_str() else {
            debug!("image event {target} has no content url");
            return Ok(());
        };
        let Some((server, media_id)) = split_mxc(mxc) else {
            warn!("malformed media url {mxc} on event {target}");
            return Ok(());
        };

        let download = self.api.download(&server, &media_id).await?;
        let filename = download.filename.unwrap_or_else(|| media_id.clone());
        let path = self.pool.store(&filename, &download.bytes)?;

        // Re-check the source before confirming; the file stays either way.
        if let Err(err) = self.api.fetch_event(room_id, target).await {
            warn!("source event {target} unavailable after download: {err}");
            return Ok(());
        }

        info!("added {} to the collection", path.display());
        let content = serde_json::json!({
            "msgtype": "m.text",
            "body": "Image added to my collection! 👍️",
            "m.relates_to": {
                "m.in_reply_to": { "event_id": target }
            },
        });
        self.api.send_message(room_id, &content).await?;
        Ok(())
    }
}

/// Split an mxc:// URI into (server name, media ID).
fn split_mxc(mxc: &str) -> Option<(String, String)> {
    let url = Url::parse(mxc).ok()?;
    if url.scheme() != "mxc" {
        return None;
    }
    let server = url.host_str()?.to_string();
    let media_id = url.path().trim_start_matches('/').to_string();
    if media_id.is_empty() || media_id.contains('/') {
        return None;
    }
    Some((server, media_id))
}
