//! JSON messages exchanged over `/ws`.
//!
//! Client frames are `{"type": "...", ...fields}`. Server frames share the
//! broadcast envelope `{"type", "data", "timestamp"}`.

use axum::extract::ws::Message;
use folio_core::types::DbId;
use folio_events::ContentEvent;
use serde::Deserialize;

// Server -> client reply types that are not broadcast events.
pub const CONNECTED: &str = "_connected";
pub const PONG: &str = "pong";
pub const ERROR: &str = "error";
pub const LIBRARY_JOINED: &str = "library_joined";
pub const LIBRARY_LEFT: &str = "library_left";
pub const LOCK_SUCCESS: &str = "lock_success";
pub const LOCK_FAILED: &str = "lock_failed";
pub const UNLOCK_SUCCESS: &str = "unlock_success";
pub const UNLOCK_FAILED: &str = "unlock_failed";
pub const UPDATE_FAILED: &str = "update_failed";

/// A message sent by a client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Ping,
    JoinLibrary { library_type: String },
    LeaveLibrary,
    LockContent { content_id: DbId },
    UnlockContent { content_id: DbId },
    UpdateContent { content_id: DbId, content: String },
}

impl ClientMessage {
    /// Parse a text frame. The error string is safe to send back.
    pub fn parse(text: &str) -> Result<Self, String> {
        serde_json::from_str(text).map_err(|e| format!("Invalid message: {e}"))
    }
}

/// Build a server frame in the broadcast envelope.
pub fn server_message(message_type: &str, data: serde_json::Value) -> Message {
    Message::Text(ContentEvent::new(message_type).with_data(data).to_wire().into())
}
