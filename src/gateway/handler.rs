//! Inbound frame dispatch: parse a request and apply it to the registry and
//! room directory.

use axum::extract::ws::Message;
use serde_json::Value;

use crate::AppState;

use super::events::{ClientRequest, ServerEvent};
use super::registry::OutboundTx;
use super::rooms::Member;

/// Handle one inbound text frame from `client_id`.
///
/// Every reply goes only to the requester; `send-message` additionally fans
/// out to the room. A frame that does not parse gets the generic
/// invalid-format reply and the connection stays open.
pub fn handle_frame(state: &AppState, client_id: &str, tx: &OutboundTx, text: &str) {
    let request: ClientRequest = match serde_json::from_str(text) {
        Ok(req) => req,
        Err(err) => {
            tracing::debug!(%client_id, %err, "unparseable frame");
            reply(tx, ServerEvent::invalid_format());
            return;
        }
    };

    match request {
        ClientRequest::SetName { name } => {
            state.clients.set_name(client_id, name.clone());
            reply(tx, ServerEvent::name_set(&name));
        }
        ClientRequest::CreateRoom {} => {
            let room_id = state.rooms.create(member(client_id, tx));
            reply(tx, ServerEvent::room_created(&room_id));
        }
        ClientRequest::JoinRoom { room_id } => {
            if state.rooms.join(member(client_id, tx), &room_id) {
                reply(tx, ServerEvent::joined(&room_id));
            } else {
                reply(tx, ServerEvent::room_not_found());
            }
        }
        ClientRequest::LeaveRoom { room_id } => {
            if state.rooms.leave(client_id, &room_id) {
                reply(tx, ServerEvent::left(&room_id));
            } else {
                reply(tx, ServerEvent::room_not_found());
            }
        }
        ClientRequest::SendMessage { room_id, message } => {
            // `by` carries the sender's display name as of right now.
            let by = state
                .clients
                .name_of(client_id)
                .unwrap_or_else(|| "Anonymous".to_string());
            let frame = ServerEvent::chat(&message.text, &by);
            if state.rooms.broadcast(&room_id, &frame).is_none() {
                reply(tx, ServerEvent::room_not_found());
            }
        }
    }
}

fn member(client_id: &str, tx: &OutboundTx) -> Member {
    Member {
        client_id: client_id.to_string(),
        tx: tx.clone(),
    }
}

/// Queue a single reply frame. A send error means the connection's loop is
/// already gone, which is not the requester's problem.
fn reply(tx: &OutboundTx, frame: Value) {
    let _ = tx.send(Message::Text(frame.to_string().into()));
}
