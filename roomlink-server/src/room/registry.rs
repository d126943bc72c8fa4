use dashmap::DashMap;
use roomlink_core::{RoomId, SessionId};
use std::sync::Arc;
use tracing::info;

struct RoomMembers {
    /// Join order. The first entry is the room host.
    members: Vec<SessionId>,
    host: SessionId,
}

/// Room membership table. The registry tracks who is where and nothing
/// else: it never touches signaling payloads.
#[derive(Clone)]
pub struct RoomRegistry {
    rooms: Arc<DashMap<RoomId, RoomMembers>>,
    /// Reverse index so a closing connection can find its room without a scan.
    index: Arc<DashMap<SessionId, RoomId>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            index: Arc::new(DashMap::new()),
        }
    }

    /// Add `sid` to the room and return the *other* current members, in
    /// join order. A session already in some room leaves it first: a
    /// participant belongs to exactly one room at a time.
    pub fn join(&self, room_id: &RoomId, sid: SessionId) -> Vec<SessionId> {
        if self.index.contains_key(&sid) {
            self.leave(&sid);
        }

        let mut entry = self
            .rooms
            .entry(room_id.clone())
            .or_insert_with(|| {
                info!("Creating new room: {}", room_id);
                RoomMembers {
                    members: Vec::new(),
                    host: sid.clone(),
                }
            });
        let others = entry.members.clone();
        entry.members.push(sid.clone());
        drop(entry);

        self.index.insert(sid, room_id.clone());
        others
    }

    /// Remove `sid` from its room. Returns the room and the remaining
    /// members so the caller can broadcast the departure. Empty rooms are
    /// reclaimed, host assignment included.
    pub fn leave(&self, sid: &SessionId) -> Option<(RoomId, Vec<SessionId>)> {
        let (_, room_id) = self.index.remove(sid)?;

        let remaining = {
            let mut entry = self.rooms.get_mut(&room_id)?;
            entry.members.retain(|m| m != sid);
            entry.members.clone()
        };

        if remaining.is_empty() {
            self.rooms.remove_if(&room_id, |_, m| m.members.is_empty());
            info!("Room {} is empty and has been closed", room_id);
        }

        Some((room_id, remaining))
    }

    pub fn members(&self, room_id: &RoomId) -> Vec<SessionId> {
        self.rooms
            .get(room_id)
            .map(|m| m.members.clone())
            .unwrap_or_default()
    }

    /// The room host is its first joiner.
    pub fn host_of(&self, room_id: &RoomId) -> Option<SessionId> {
        self.rooms.get(room_id).map(|m| m.host.clone())
    }

    pub fn room_of(&self, sid: &SessionId) -> Option<RoomId> {
        self.index.get(sid).map(|r| r.clone())
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}
