//! Room event model shared between the sync decoder and the classifier.

/// Fields common to every event delivered in a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventMeta {
    /// Room the event was delivered in.
    pub room_id: String,
    /// Fully qualified user id of the sender.
    pub sender: String,
    /// Server-assigned unique event id.
    pub event_id: String,
    /// Origin server timestamp in milliseconds since the UNIX epoch.
    pub origin_ts: i64,
}

/// Payload of a room event, one variant per recognized discriminant.
///
/// Everything the bot does not act on lands in `Unknown` so the router
/// can still log it for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventContent {
    /// Plain text message (`m.text`).
    Text { body: String },
    /// Image message (`m.image`) carrying a content reference.
    Image { url: String },
    /// Reaction referencing another event plus a short key.
    Reaction { target: String, key: String },
    /// Any event type the decoder does not model.
    Unknown { event_type: String },
}

/// A single decoded room event. Constructed by the protocol layer,
/// consumed exactly once by the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomEvent {
    pub meta: EventMeta,
    pub content: EventContent,
}

impl RoomEvent {
    /// Whether this is a room message (text or image) as opposed to a
    /// reaction or an unmodeled event.
    pub fn is_message(&self) -> bool {
        matches!(
            self.content,
            EventContent::Text { .. } | EventContent::Image { .. }
        )
    }
}
