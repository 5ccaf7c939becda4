//! Registry of live client connections.

use axum::extract::ws::{CloseFrame, Message};
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::id;

/// Sender half of a connection's outbound frame queue. The connection's
/// event loop drains the other half into the WebSocket sink.
pub type OutboundTx = mpsc::UnboundedSender<Message>;

/// Per-connection state.
pub struct ClientEntry {
    /// Display name, mutable via `set-name`. Broadcasts read it at send
    /// time, so a rename is reflected in subsequent `chatMsg.by` fields.
    pub name: String,
    pub tx: OutboundTx,
}

/// Shared registry of all live connections.
///
/// Uses `DashMap` for shard-level concurrency and `parking_lot::Mutex` per
/// entry for non-poisoning, fast locking. Knows nothing about rooms; room
/// cleanup on disconnect is the directory's job.
pub struct ClientRegistry {
    clients: DashMap<String, Mutex<ClientEntry>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self {
            clients: DashMap::new(),
        }
    }

    /// Register a new connection and return its freshly assigned client id.
    ///
    /// Ids are 6-digit decimal strings and are not checked for collisions
    /// among live clients.
    pub fn register(&self, tx: OutboundTx) -> String {
        let client_id = id::six_digit_id();
        let entry = ClientEntry {
            name: "Anonymous".to_string(),
            tx,
        };
        self.clients.insert(client_id.clone(), Mutex::new(entry));
        client_id
    }

    /// Overwrite the display name. Any string is accepted; no uniqueness or
    /// validation is enforced.
    pub fn set_name(&self, client_id: &str, name: String) {
        if let Some(entry) = self.clients.get(client_id) {
            entry.lock().name = name;
        }
    }

    /// Current display name for a live client.
    pub fn name_of(&self, client_id: &str) -> Option<String> {
        self.clients.get(client_id).map(|e| e.lock().name.clone())
    }

    /// Drop a connection's entry on disconnect.
    pub fn remove(&self, client_id: &str) {
        self.clients.remove(client_id);
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Queue a close frame to every live connection. Used by graceful
    /// shutdown before the process exits.
    pub fn close_all(&self, code: u16, reason: &str) {
        for entry in self.clients.iter() {
            let e = entry.value().lock();
            let frame = Message::Close(Some(CloseFrame {
                code,
                reason: reason.to_string().into(),
            }));
            if e.tx.send(frame).is_err() {
                tracing::debug!(client_id = %entry.key(), "connection already gone, skipping close frame");
            }
        }
    }
}
