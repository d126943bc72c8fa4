use crate::transport::PeerTransport;
use anyhow::Result;
use roomlink_core::{IceCandidateInit, SessionDescription, SessionId};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkPhase {
    /// Record exists but negotiation has not started yet (lazily created
    /// by an inbound candidate).
    New,
    /// We sent an offer and are waiting for the answer.
    Offering,
    /// We answered a remote offer and are waiting for the media path.
    Answered,
    Connected,
    Closed,
}

/// Per-remote-peer connection record: one transport, the negotiation
/// phase, and candidates queued until the remote description lands.
pub struct PeerLink<T: PeerTransport> {
    remote: SessionId,
    phase: LinkPhase,
    transport: T,
    remote_set: bool,
    pending_candidates: Vec<IceCandidateInit>,
}

impl<T: PeerTransport> PeerLink<T> {
    pub fn new(remote: SessionId, transport: T) -> Self {
        Self {
            remote,
            phase: LinkPhase::New,
            transport,
            remote_set: false,
            pending_candidates: Vec::new(),
        }
    }

    pub fn phase(&self) -> LinkPhase {
        self.phase
    }

    pub fn remote(&self) -> &SessionId {
        &self.remote
    }

    /// Initiator path: produce the local offer.
    pub async fn start_offer(&mut self) -> Result<String> {
        let sdp = self.transport.create_offer().await?;
        self.phase = LinkPhase::Offering;
        Ok(sdp)
    }

    /// Responder path: apply the remote offer and produce an answer. A
    /// repeat offer renegotiates through this same record. Candidates that
    /// trickled in before the offer are applied first, in arrival order.
    pub async fn accept_offer(&mut self, sdp: String) -> Result<String> {
        self.transport
            .set_remote_description(SessionDescription::offer(sdp))
            .await?;
        self.remote_set = true;
        self.drain_pending().await;

        let answer = self.transport.create_answer().await?;
        self.phase = LinkPhase::Answered;
        Ok(answer)
    }

    /// Initiator completion: the remote answer arrived.
    pub async fn accept_answer(&mut self, sdp: String) -> Result<()> {
        self.transport
            .set_remote_description(SessionDescription::answer(sdp))
            .await?;
        self.remote_set = true;
        self.drain_pending().await;

        self.phase = LinkPhase::Connected;
        Ok(())
    }

    /// Apply a trickled candidate, or queue it while the remote
    /// description is still outstanding.
    pub async fn add_candidate(&mut self, candidate: IceCandidateInit) -> Result<()> {
        if !self.remote_set {
            debug!(
                "Queueing candidate from {} until the remote description lands",
                self.remote
            );
            self.pending_candidates.push(candidate);
            return Ok(());
        }
        self.transport.add_ice_candidate(candidate).await
    }

    /// Transport-level confirmation that media flows; how the answering
    /// side reaches `Connected`.
    pub fn mark_connected(&mut self) {
        if self.phase != LinkPhase::Closed {
            self.phase = LinkPhase::Connected;
        }
    }

    /// Departure teardown. In-flight platform work for this peer may still
    /// resolve against a closed transport; those failures are swallowed.
    pub async fn close(&mut self) {
        self.phase = LinkPhase::Closed;
        if let Err(e) = self.transport.close().await {
            debug!("Error closing transport for {}: {:?}", self.remote, e);
        }
    }

    async fn drain_pending(&mut self) {
        for candidate in std::mem::take(&mut self.pending_candidates) {
            if let Err(e) = self.transport.add_ice_candidate(candidate).await {
                // A lost candidate degrades connectivity, not correctness.
                warn!(
                    "Failed to apply queued candidate from {}: {:?}",
                    self.remote, e
                );
            }
        }
    }
}
