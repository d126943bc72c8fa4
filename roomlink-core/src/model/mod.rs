mod event;
mod room;
mod session;
mod signal;

pub use event::{ClientEvent, ServerEvent};
pub use room::RoomId;
pub use session::SessionId;
pub use signal::{IceCandidateInit, IceServerConfig, SdpKind, SessionDescription, SignalData};
