//! Wire-format frames exchanged with clients.

use serde::Deserialize;
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Client → Server requests
// ---------------------------------------------------------------------------

/// A request frame received from a client.
///
/// Frames are JSON objects of the shape `{ "type": ..., "payload": ... }`.
/// Anything that fails to deserialize — bad JSON, an unrecognized type, or a
/// payload with the wrong shape — gets the generic invalid-format reply; the
/// connection is never closed over it.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum ClientRequest {
    SetName {
        name: String,
    },
    CreateRoom {},
    JoinRoom {
        #[serde(rename = "roomId")]
        room_id: String,
    },
    LeaveRoom {
        #[serde(rename = "roomId")]
        room_id: String,
    },
    SendMessage {
        #[serde(rename = "roomId")]
        room_id: String,
        message: ChatText,
    },
}

/// Body of a `send-message` request.
#[derive(Debug, Deserialize)]
pub struct ChatText {
    pub text: String,
}

// ---------------------------------------------------------------------------
// Server → Client frames
// ---------------------------------------------------------------------------

/// Builders for every frame the relay sends to clients.
pub struct ServerEvent;

impl ServerEvent {
    /// Connect ack, sent once immediately after the upgrade.
    pub fn connected(client_id: &str) -> Value {
        json!({ "message": "connected", "clientId": client_id })
    }

    pub fn name_set(name: &str) -> Value {
        json!({ "message": format!("Name set to {name}") })
    }

    pub fn room_created(room_id: &str) -> Value {
        json!({ "message": format!("Room created with ID: {room_id}"), "roomId": room_id })
    }

    pub fn joined(room_id: &str) -> Value {
        json!({ "message": format!("Joined room {room_id}") })
    }

    pub fn left(room_id: &str) -> Value {
        json!({ "message": format!("Left room {room_id}") })
    }

    pub fn room_not_found() -> Value {
        json!({ "message": "Room not found" })
    }

    /// A chat message fanned out to room members. `by` is the sender's
    /// display name at send time, not an identifier.
    pub fn chat(text: &str, by: &str) -> Value {
        json!({ "chatMsg": { "text": text, "by": by } })
    }

    /// Periodic snapshot of active room ids.
    pub fn room_listing(room_ids: &[String]) -> Value {
        json!({ "rooms": room_ids })
    }

    pub fn invalid_format() -> Value {
        json!({ "message": "Invalid message format" })
    }
}
