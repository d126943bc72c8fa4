use crate::media::LocalStream;
use anyhow::Result;
use async_trait::async_trait;
use roomlink_core::{IceCandidateInit, SessionDescription, SessionId};
use tokio::sync::mpsc;

/// Notifications a transport pushes onto the channel of the mesh loop that
/// owns it.
#[derive(Debug)]
pub enum TransportEvent<Track> {
    /// A locally gathered candidate to relay to the remote peer, one at a
    /// time as discovered.
    CandidateGenerated {
        sid: SessionId,
        candidate: IceCandidateInit,
    },
    /// The remote peer's media arrived.
    TrackReceived { sid: SessionId, track: Track },
    /// The media path is established. Failure states are deliberately not
    /// surfaced: there is no restart logic in this core.
    Connected { sid: SessionId },
}

/// One platform connection toward a single remote peer.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Create an offer and install it as the local description.
    async fn create_offer(&self) -> Result<String>;

    /// Create an answer to the previously applied remote offer and install
    /// it as the local description.
    async fn create_answer(&self) -> Result<String>;

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: IceCandidateInit) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

/// Builds transports wired to the mesh loop's event channel, with the local
/// stream's tracks attached before any negotiation starts.
#[async_trait]
pub trait TransportFactory: Send + Sync {
    type Transport: PeerTransport;
    type Track: Send + 'static;
    type Stream: LocalStream;

    async fn create(
        &self,
        remote: &SessionId,
        local: &Self::Stream,
        events: mpsc::Sender<TransportEvent<Self::Track>>,
    ) -> Result<Self::Transport>;
}
