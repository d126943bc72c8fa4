use crate::room::RoomRegistry;
use dashmap::DashMap;
use roomlink_core::{ClientEvent, RoomId, ServerEvent, SessionId};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

struct RelayInner {
    /// One FIFO outbound channel per connected session. Sequential
    /// per-connection dispatch plus per-recipient FIFO delivery is what
    /// preserves signal order between any (sender, target) pair.
    peers: DashMap<SessionId, mpsc::UnboundedSender<ServerEvent>>,
    rooms: RoomRegistry,
}

/// The relay coordinator: room membership plus envelope forwarding. It
/// never inspects SDP or candidate contents and never blocks on a client.
#[derive(Clone)]
pub struct RelayService {
    inner: Arc<RelayInner>,
}

impl RelayService {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RelayInner {
                peers: DashMap::new(),
                rooms: RoomRegistry::new(),
            }),
        }
    }

    pub fn rooms(&self) -> &RoomRegistry {
        &self.inner.rooms
    }

    /// Register a freshly connected session and tell it its id.
    pub fn register(&self, sid: SessionId, tx: mpsc::UnboundedSender<ServerEvent>) {
        self.inner.peers.insert(sid.clone(), tx);
        self.send_to(&sid, ServerEvent::Welcome { sid: sid.clone() });
    }

    /// Dispatch one inbound frame. All work here is synchronous channel
    /// pushes; room negotiation happens on the clients.
    pub fn handle_event(&self, sid: &SessionId, event: ClientEvent) {
        match event {
            ClientEvent::Join { room_id } => {
                let others = self.inner.rooms.join(&room_id, sid.clone());
                info!("Session {} joined room {}", sid, room_id);
                // The joiner alone learns the roster; it carries the burden
                // of offering to every member listed here.
                self.send_to(sid, ServerEvent::ExistingParticipants { sids: others });
            }

            ClientEvent::Signal {
                target_sid,
                signal_data,
            } => {
                self.send_to(
                    &target_sid,
                    ServerEvent::Signal {
                        sender_sid: sid.clone(),
                        signal_data,
                    },
                );
            }

            ClientEvent::CodeChanged { room_id, code } => {
                self.broadcast(&room_id, ServerEvent::CodeUpdate { code }, Some(sid));
            }

            ClientEvent::ToggleEditorVisibility {
                room_id,
                is_visible,
            } => {
                if self.inner.rooms.host_of(&room_id).as_ref() != Some(sid) {
                    warn!(
                        "Session {} tried to toggle the editor in {} but is not the host",
                        sid, room_id
                    );
                    return;
                }
                self.broadcast(
                    &room_id,
                    ServerEvent::EditorStateChanged {
                        visible: is_visible,
                    },
                    None,
                );
            }
        }
    }

    /// Tear down a closed connection: drop its channel, remove its
    /// membership, and announce the departure to the rest of its room.
    pub fn disconnect(&self, sid: &SessionId) {
        self.inner.peers.remove(sid);

        if let Some((room_id, remaining)) = self.inner.rooms.leave(sid) {
            info!("Session {} left room {}", sid, room_id);
            for member in remaining {
                self.send_to(&member, ServerEvent::UserLeft { sid: sid.clone() });
            }
        }
    }

    /// Best-effort single-recipient delivery. An unknown target means the
    /// peer is already gone: the envelope is dropped, the sender learns
    /// nothing, and cleanup rides on the eventual `user_left`.
    pub(crate) fn send_to(&self, sid: &SessionId, event: ServerEvent) {
        let Some(peer) = self.inner.peers.get(sid) else {
            warn!("Dropping event for disconnected session {}", sid);
            return;
        };
        if peer.send(event).is_err() {
            warn!("Outbound channel for session {} is closed", sid);
        }
    }

    fn broadcast(&self, room_id: &RoomId, event: ServerEvent, skip: Option<&SessionId>) {
        for member in self.inner.rooms.members(room_id) {
            if skip == Some(&member) {
                continue;
            }
            self.send_to(&member, event.clone());
        }
    }
}

impl Default for RelayService {
    fn default() -> Self {
        Self::new()
    }
}
