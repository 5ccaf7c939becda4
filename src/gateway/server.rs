//! WebSocket upgrade handler and per-connection event loop.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time;

use crate::AppState;

use super::events::ServerEvent;
use super::handler::handle_frame;

pub fn router() -> Router<AppState> {
    Router::new().route("/ws", get(ws_upgrade))
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

/// One task per connection. Events for this connection are processed here in
/// arrival order; all cross-connection state sits behind the registry and
/// directory locks.
async fn handle_connection(socket: WebSocket, state: AppState) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    let client_id = state.clients.register(tx.clone());

    // Connect ack goes out before anything else.
    let ack = ServerEvent::connected(&client_id);
    if ws_tx.send(Message::Text(ack.to_string().into())).await.is_err() {
        state.clients.remove(&client_id);
        return;
    }

    tracing::info!(%client_id, "client connected");

    // Periodic room-listing push. The interval lives in this loop's frame,
    // so it is cancelled together with the connection.
    let mut room_list_timer = time::interval(state.config.room_list_interval);
    room_list_timer.tick().await; // First tick fires immediately; skip it.

    loop {
        tokio::select! {
            // Client sends us a frame.
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        handle_frame(&state, &client_id, &tx, &text);
                    }
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(err)) => {
                        tracing::debug!(?err, %client_id, "ws read error");
                        break;
                    }
                    _ => continue,
                }
            }

            // A queued outbound frame: a reply, a room broadcast, or the
            // shutdown close.
            queued = rx.recv() => {
                match queued {
                    Some(frame) => {
                        let closing = matches!(frame, Message::Close(_));
                        if ws_tx.send(frame).await.is_err() || closing {
                            break;
                        }
                    }
                    None => break,
                }
            }

            // Room listing snapshot.
            _ = room_list_timer.tick() => {
                let listing = ServerEvent::room_listing(&state.rooms.room_ids());
                if ws_tx.send(Message::Text(listing.to_string().into())).await.is_err() {
                    break;
                }
            }
        }
    }

    state.clients.remove(&client_id);
    state.rooms.remove_client_everywhere(&client_id);
    tracing::info!(%client_id, "client disconnected");
}
