//! Pure event classification.
//!
//! `route` maps a decoded [`RoomEvent`] to the handler that should run.
//! It is a pure function of the event, the backlog flag, the bot's own
//! identity and the configured approve key, so classification can be
//! tested without a live connection.

use crate::event::{EventContent, RoomEvent};

/// Prefix that marks a text message as a command.
pub const COMMAND_PREFIX: char = '!';

/// Recognized command tokens (everything after the prefix).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `!pic` — post one random image, once per sender per cycle.
    Pic,
    /// `!hello` — typing indicator plus greeting.
    Hello,
    /// Any other token; ignored, kept for diagnostics.
    Unrecognized(String),
}

/// Why an event was dropped without reaching a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Part of the historical backlog replayed on first connect.
    Backlog,
    /// Sent by the bot's own identity.
    OwnEvent,
    /// Text message without the command prefix.
    PlainText,
    /// Reaction with a key other than the approve key.
    OtherReactionKey,
    /// Event type the bot does not model.
    UnknownType,
}

/// Routing decision for one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Dispatch to a command handler.
    Command(Command),
    /// Image message: logged only, reserved extension point.
    ImageSeen,
    /// Approve reaction: dispatch to the harvester with the target event id.
    Harvest { target: String },
    /// No handler runs.
    Ignore(IgnoreReason),
}

/// Classify one event.
///
/// Backlog events and the bot's own events never reach a handler,
/// regardless of their content.
pub fn route(event: &RoomEvent, is_backlog: bool, own_user: &str, approve_key: &str) -> Route {
    if is_backlog {
        return Route::Ignore(IgnoreReason::Backlog);
    }
    if event.meta.sender == own_user {
        return Route::Ignore(IgnoreReason::OwnEvent);
    }

    match &event.content {
        EventContent::Text { body } => match body.strip_prefix(COMMAND_PREFIX) {
            Some("pic") => Route::Command(Command::Pic),
            Some("hello") => Route::Command(Command::Hello),
            Some(other) => Route::Command(Command::Unrecognized(other.to_string())),
            None => Route::Ignore(IgnoreReason::PlainText),
        },
        EventContent::Image { .. } => Route::ImageSeen,
        EventContent::Reaction { target, key } => {
            if key == approve_key {
                Route::Harvest {
                    target: target.clone(),
                }
            } else {
                Route::Ignore(IgnoreReason::OtherReactionKey)
            }
        }
        EventContent::Unknown { .. } => Route::Ignore(IgnoreReason::UnknownType),
    }
}
