//! Room directory and broadcast dispatcher.

use axum::extract::ws::Message;
use parking_lot::Mutex;
use serde_json::Value;

use crate::id;

use super::registry::OutboundTx;

/// A room member: the client id plus a handle to its outbound queue.
#[derive(Clone)]
pub struct Member {
    pub client_id: String,
    pub tx: OutboundTx,
}

/// A named group of member connections, in insertion order.
///
/// Duplicates are not prevented: a client that joins the same room twice is
/// listed twice and receives each broadcast twice.
pub struct Room {
    pub room_id: String,
    pub members: Vec<Member>,
}

/// Directory of active rooms.
///
/// One coarse mutex guards the whole directory, so every mutation runs to
/// completion before the next one starts. Lookups are linear scans over the
/// full set, acceptable at this scale. A room with zero members never
/// persists; it is deleted the moment its last member leaves or disconnects.
///
/// Members do not hold a list of the rooms they belong to; disconnect
/// cleanup discovers membership by scanning every room.
pub struct RoomDirectory {
    rooms: Mutex<Vec<Room>>,
}

impl RoomDirectory {
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(Vec::new()),
        }
    }

    /// Create a room with `owner` as its only member. Returns the new room
    /// id. Room ids share the 6-digit scheme with client ids and are
    /// likewise not checked for collisions.
    pub fn create(&self, owner: Member) -> String {
        let room_id = id::six_digit_id();
        self.rooms.lock().push(Room {
            room_id: room_id.clone(),
            members: vec![owner],
        });
        tracing::info!(%room_id, "room created");
        room_id
    }

    /// Append `member` to the room's member list. Returns `false` if the
    /// room does not exist, in which case nothing is mutated. There is no
    /// duplicate check.
    pub fn join(&self, member: Member, room_id: &str) -> bool {
        let mut rooms = self.rooms.lock();
        match rooms.iter_mut().find(|r| r.room_id == room_id) {
            Some(room) => {
                room.members.push(member);
                true
            }
            None => false,
        }
    }

    /// Remove every occurrence of `client_id` from the room (filter
    /// semantics, not single-removal), deleting the room if it empties.
    /// Returns `false` if the room does not exist.
    pub fn leave(&self, client_id: &str, room_id: &str) -> bool {
        let mut rooms = self.rooms.lock();
        let Some(idx) = rooms.iter().position(|r| r.room_id == room_id) else {
            return false;
        };
        rooms[idx].members.retain(|m| m.client_id != client_id);
        if rooms[idx].members.is_empty() {
            rooms.remove(idx);
            tracing::info!(%room_id, "room deleted, last member left");
        }
        true
    }

    /// Disconnect cleanup: filter `client_id` out of every room, deleting
    /// rooms that become empty. The only path that removes a client from
    /// multiple rooms at once.
    pub fn remove_client_everywhere(&self, client_id: &str) {
        let mut rooms = self.rooms.lock();
        rooms.retain_mut(|room| {
            room.members.retain(|m| m.client_id != client_id);
            if room.members.is_empty() {
                tracing::info!(room_id = %room.room_id, "room deleted, last member disconnected");
                false
            } else {
                true
            }
        });
    }

    /// Deliver `frame` to every current member of the room, in member-list
    /// order. Delivery is fire-and-forget: a member whose outbound queue is
    /// gone is skipped with a debug log and the remaining members still get
    /// the frame. Returns the number of members the frame was queued for,
    /// or `None` if the room does not exist.
    pub fn broadcast(&self, room_id: &str, frame: &Value) -> Option<usize> {
        let rooms = self.rooms.lock();
        let room = rooms.iter().find(|r| r.room_id == room_id)?;
        let text = frame.to_string();
        let mut delivered = 0;
        for member in &room.members {
            if member.tx.send(Message::Text(text.clone().into())).is_err() {
                tracing::debug!(
                    client_id = %member.client_id,
                    %room_id,
                    "dropping frame for closed connection"
                );
                continue;
            }
            delivered += 1;
        }
        Some(delivered)
    }

    /// Snapshot of active room ids for the periodic listing push.
    pub fn room_ids(&self) -> Vec<String> {
        self.rooms.lock().iter().map(|r| r.room_id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.rooms.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.lock().is_empty()
    }

    /// Member client ids of a room, in list order. Test-only visibility.
    #[cfg(test)]
    fn members_of(&self, room_id: &str) -> Option<Vec<String>> {
        let rooms = self.rooms.lock();
        let room = rooms.iter().find(|r| r.room_id == room_id)?;
        Some(room.members.iter().map(|m| m.client_id.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn member(client_id: &str) -> (Member, UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Member {
                client_id: client_id.to_string(),
                tx,
            },
            rx,
        )
    }

    /// A room exists iff its member list is non-empty.
    fn assert_no_empty_rooms(directory: &RoomDirectory) {
        for room_id in directory.room_ids() {
            assert!(!directory.members_of(&room_id).unwrap().is_empty());
        }
    }

    #[test]
    fn create_inserts_room_with_owner() {
        let directory = RoomDirectory::new();
        let (owner, _rx) = member("111111");
        let room_id = directory.create(owner);

        assert_eq!(room_id.len(), 6);
        assert_eq!(directory.room_ids(), vec![room_id.clone()]);
        assert_eq!(directory.members_of(&room_id).unwrap(), vec!["111111"]);
        assert_no_empty_rooms(&directory);
    }

    #[test]
    fn join_unknown_room_mutates_nothing() {
        let directory = RoomDirectory::new();
        let (m, _rx) = member("111111");
        assert!(!directory.join(m, "000000"));
        assert!(directory.is_empty());
    }

    #[test]
    fn room_deleted_when_last_member_leaves() {
        let directory = RoomDirectory::new();
        let (owner, _rx) = member("111111");
        let room_id = directory.create(owner);

        assert!(directory.leave("111111", &room_id));
        assert!(directory.is_empty());
        // A second leave sees no room.
        assert!(!directory.leave("111111", &room_id));
    }

    #[test]
    fn leave_then_rejoin_restores_membership() {
        let directory = RoomDirectory::new();
        let (owner, _orx) = member("111111");
        let room_id = directory.create(owner);
        let (other, _rx) = member("222222");
        assert!(directory.join(other, &room_id));

        assert!(directory.leave("222222", &room_id));
        assert_eq!(directory.members_of(&room_id).unwrap(), vec!["111111"]);

        let (other, _rx) = member("222222");
        assert!(directory.join(other, &room_id));
        assert_eq!(
            directory.members_of(&room_id).unwrap(),
            vec!["111111", "222222"]
        );
        assert_no_empty_rooms(&directory);
    }

    #[test]
    fn leave_removes_all_occurrences() {
        let directory = RoomDirectory::new();
        let (owner, _orx) = member("111111");
        let room_id = directory.create(owner);

        // Same client joins twice on top of its membership from create.
        let (dup, _rx1) = member("111111");
        directory.join(dup, &room_id);
        let (dup, _rx2) = member("111111");
        directory.join(dup, &room_id);
        let (keeper, _krx) = member("222222");
        directory.join(keeper, &room_id);

        assert!(directory.leave("111111", &room_id));
        assert_eq!(directory.members_of(&room_id).unwrap(), vec!["222222"]);
        assert_no_empty_rooms(&directory);
    }

    #[test]
    fn duplicate_member_receives_broadcast_twice() {
        let directory = RoomDirectory::new();
        let (owner, mut owner_rx) = member("111111");
        let room_id = directory.create(owner);
        let (dup, _dup_rx) = member("111111");
        directory.join(dup, &room_id);

        // The duplicate entry shares the client but not the channel here;
        // what matters is one send per list entry.
        let delivered = directory
            .broadcast(&room_id, &json!({ "chatMsg": { "text": "hi", "by": "Anonymous" } }))
            .unwrap();
        assert_eq!(delivered, 2);
        assert!(owner_rx.try_recv().is_ok());
    }

    #[test]
    fn broadcast_reaches_every_member_including_sender() {
        let directory = RoomDirectory::new();
        let (owner, mut rx_a) = member("111111");
        let room_id = directory.create(owner);
        let (b, mut rx_b) = member("222222");
        directory.join(b, &room_id);
        let (c, mut rx_c) = member("333333");
        directory.join(c, &room_id);

        let frame = json!({ "chatMsg": { "text": "hi", "by": "ada" } });
        let delivered = directory.broadcast(&room_id, &frame).unwrap();
        assert_eq!(delivered, 3);

        for rx in [&mut rx_a, &mut rx_b, &mut rx_c] {
            match rx.try_recv().unwrap() {
                Message::Text(text) => {
                    let got: serde_json::Value = serde_json::from_str(&text).unwrap();
                    assert_eq!(got, frame);
                }
                other => panic!("expected text frame, got {other:?}"),
            }
        }
    }

    #[test]
    fn broadcast_skips_dead_members_without_aborting() {
        let directory = RoomDirectory::new();
        let (owner, rx_dead) = member("111111");
        let room_id = directory.create(owner);
        drop(rx_dead);
        let (alive, mut rx_alive) = member("222222");
        directory.join(alive, &room_id);

        let delivered = directory
            .broadcast(&room_id, &json!({ "chatMsg": { "text": "hi", "by": "Anonymous" } }))
            .unwrap();
        assert_eq!(delivered, 1);
        assert!(rx_alive.try_recv().is_ok());
    }

    #[test]
    fn broadcast_to_unknown_room_is_none() {
        let directory = RoomDirectory::new();
        assert!(directory.broadcast("000000", &json!({})).is_none());
        assert!(directory.is_empty());
    }

    #[test]
    fn disconnect_cleanup_spans_all_rooms() {
        let directory = RoomDirectory::new();

        // Client 111111 owns one room alone and shares another with 222222.
        let (solo_owner, _rx1) = member("111111");
        let solo = directory.create(solo_owner);
        let (shared_owner, _rx2) = member("222222");
        let shared = directory.create(shared_owner);
        let (joiner, _rx3) = member("111111");
        directory.join(joiner, &shared);

        directory.remove_client_everywhere("111111");

        // The solo room emptied and is gone; the shared one survives.
        assert_eq!(directory.room_ids(), vec![shared.clone()]);
        assert_eq!(directory.members_of(&shared).unwrap(), vec!["222222"]);
        assert!(directory.members_of(&solo).is_none());
        assert_no_empty_rooms(&directory);
    }
}
