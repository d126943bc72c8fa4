use crate::model::room::RoomId;
use crate::model::session::SessionId;
use crate::model::signal::SignalData;
use serde::{Deserialize, Serialize};

/// Frames a client sends to the relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    Join {
        room_id: RoomId,
    },
    Signal {
        target_sid: SessionId,
        signal_data: SignalData,
    },
    CodeChanged {
        room_id: RoomId,
        code: String,
    },
    ToggleEditorVisibility {
        room_id: RoomId,
        is_visible: bool,
    },
}

/// Frames the relay sends to a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Session id assignment, sent once right after the socket opens.
    Welcome { sid: SessionId },
    /// Roster of the *other* room members, sent to the joiner only.
    ExistingParticipants { sids: Vec<SessionId> },
    /// Forwarded negotiation envelope, annotated with its sender.
    Signal {
        sender_sid: SessionId,
        signal_data: SignalData,
    },
    UserLeft { sid: SessionId },
    CodeUpdate { code: String },
    EditorStateChanged { visible: bool },
}
