//! Decoding of /sync responses into room events.
//!
//! The wire format nests timeline events under each joined room; the
//! session loop wants a flat, ordered list with the batch token. Events
//! we don't understand decode to [`EventContent::Unknown`] rather than
//! failing the whole batch.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use picbot_core::{EventContent, EventMeta, RoomEvent};

/// Raw /sync response body.
#[derive(Debug, Deserialize)]
pub struct SyncResponse {
    pub next_batch: String,
    #[serde(default)]
    pub rooms: Rooms,
}

#[derive(Debug, Default, Deserialize)]
pub struct Rooms {
    #[serde(default)]
    pub join: BTreeMap<String, JoinedRoom>,
}

#[derive(Debug, Deserialize)]
pub struct JoinedRoom {
    #[serde(default)]
    pub timeline: Timeline,
}

#[derive(Debug, Default, Deserialize)]
pub struct Timeline {
    /// Left as raw JSON so one undecodable event never fails the batch.
    #[serde(default)]
    pub events: Vec<Value>,
}

/// A timeline event as sent on the wire.
#[derive(Debug, Deserialize)]
pub struct RawEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub sender: String,
    pub event_id: String,
    #[serde(default)]
    pub origin_server_ts: i64,
    #[serde(default)]
    pub content: Value,
}

/// One batch of events from a single /sync call.
#[derive(Debug, Clone)]
pub struct SyncBatch {
    pub next_batch: String,
    pub events: Vec<RoomEvent>,
}

/// Flatten a sync response into batch order (per room, timeline order).
///
/// Each event is decoded individually; one with a broken envelope is
/// warn-logged and dropped, and the rest of the batch goes through.
pub fn flatten(response: SyncResponse) -> SyncBatch {
    let mut events = Vec::new();
    for (room_id, room) in response.rooms.join {
        for value in room.timeline.events {
            match serde_json::from_value::<RawEvent>(value) {
                Ok(raw) => events.push(decode_event(&room_id, raw)),
                Err(err) => warn!("dropping undecodable event in {room_id}: {err}"),
            }
        }
    }
    SyncBatch {
        next_batch: response.next_batch,
        events,
    }
}

/// Decode a single timeline event.
///
/// Malformed or unrecognized content yields `Unknown` so one bad event
/// never poisons the batch.
pub fn decode_event(room_id: &str, raw: RawEvent) -> RoomEvent {
    let meta = EventMeta {
        room_id: room_id.to_string(),
        sender: raw.sender,
        event_id: raw.event_id,
        origin_ts: raw.origin_server_ts,
    };

    let content = match raw.event_type.as_str() {
        "m.room.message" => match raw.content["msgtype"].as_str() {
            Some("m.text") => match raw.content["body"].as_str() {
                Some(body) => EventContent::Text {
                    body: body.to_string(),
                },
                None => EventContent::Unknown {
                    event_type: raw.event_type,
                },
            },
            Some("m.image") => match raw.content["url"].as_str() {
                Some(url) => EventContent::Image {
                    url: url.to_string(),
                },
                None => EventContent::Unknown {
                    event_type: raw.event_type,
                },
            },
            _ => EventContent::Unknown {
                event_type: raw.event_type,
            },
        },
        "m.reaction" => {
            let relates = &raw.content["m.relates_to"];
            match (relates["event_id"].as_str(), relates["key"].as_str()) {
                (Some(target), Some(key)) => EventContent::Reaction {
                    target: target.to_string(),
                    key: key.to_string(),
                },
                _ => EventContent::Unknown {
                    event_type: raw.event_type,
                },
            }
        }
        _ => EventContent::Unknown {
            event_type: raw.event_type,
        },
    };

    RoomEvent { meta, content }
}
