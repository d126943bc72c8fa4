use roomlink_core::{ClientEvent, RoomId, ServerEvent, SessionId, SignalData};
use roomlink_server::RelayService;
use tokio::sync::mpsc;

/// A fake connected client: a registered session plus the receiving end of
/// its outbound channel, so tests can assert on every event the relay sends.
pub struct TestPeer {
    pub sid: SessionId,
    rx: mpsc::UnboundedReceiver<ServerEvent>,
}

impl TestPeer {
    /// Register a new session with the relay and swallow the `welcome`
    /// frame after checking it carries the right id.
    pub fn connect(relay: &RelayService) -> Self {
        let sid = SessionId::new();
        let (tx, rx) = mpsc::unbounded_channel();
        relay.register(sid.clone(), tx);

        let mut peer = Self { sid, rx };
        match peer.next_event() {
            Some(ServerEvent::Welcome { sid }) => assert_eq!(sid, peer.sid),
            other => panic!("expected welcome, got {:?}", other),
        }
        peer
    }

    /// Connect and join in one step, returning the roster the relay replied
    /// with.
    pub fn join(relay: &RelayService, room: &RoomId) -> (Self, Vec<SessionId>) {
        let mut peer = Self::connect(relay);
        relay.handle_event(
            &peer.sid,
            ClientEvent::Join {
                room_id: room.clone(),
            },
        );
        let roster = match peer.next_event() {
            Some(ServerEvent::ExistingParticipants { sids }) => sids,
            other => panic!("expected existing_participants, got {:?}", other),
        };
        (peer, roster)
    }

    pub fn send_signal(&self, relay: &RelayService, target: &SessionId, data: SignalData) {
        relay.handle_event(
            &self.sid,
            ClientEvent::Signal {
                target_sid: target.clone(),
                signal_data: data,
            },
        );
    }

    /// Pop the next delivered event, if any. Dispatch is synchronous so no
    /// waiting is ever needed.
    pub fn next_event(&mut self) -> Option<ServerEvent> {
        self.rx.try_recv().ok()
    }

    pub fn drain(&mut self) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Some(ev) = self.next_event() {
            events.push(ev);
        }
        events
    }
}

pub fn offer(sdp: &str) -> SignalData {
    SignalData::Offer {
        sdp: sdp.to_string(),
    }
}

pub fn answer(sdp: &str) -> SignalData {
    SignalData::Answer {
        sdp: sdp.to_string(),
    }
}

pub fn candidate(body: &str) -> SignalData {
    SignalData::IceCandidate {
        candidate: roomlink_core::IceCandidateInit {
            candidate: body.to_string(),
            sdp_mid: Some("0".to_string()),
            sdp_m_line_index: Some(0),
        },
    }
}
