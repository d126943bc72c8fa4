use crate::error::MeshError;
use crate::link::{LinkPhase, PeerLink};
use crate::media::{LocalStream, MediaSource, MediaToggle, TrackKind};
use crate::relay::RelaySink;
use crate::transport::{TransportEvent, TransportFactory};
use roomlink_core::{RoomId, ServerEvent, SessionId, SignalData};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Local user intents fed into the mesh loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshCommand {
    ToggleVideo,
    ToggleAudio,
    Leave,
}

/// Updates for the rendering collaborator, keyed by remote session id.
#[derive(Debug)]
pub enum RenderUpdate<Track> {
    TrackAdded { sid: SessionId, track: Track },
    PeerRemoved { sid: SessionId },
}

/// One client's view of the mesh: the map of per-peer link records and the
/// negotiation logic that keeps it consistent with the room.
///
/// Everything runs on one task. Handlers await platform futures inline;
/// events that arrive meanwhile queue in the channels, so no record is ever
/// observed mid-mutation.
pub struct MeshClient<F: TransportFactory> {
    room: RoomId,
    local_sid: Option<SessionId>,
    links: HashMap<SessionId, PeerLink<F::Transport>>,
    local: F::Stream,
    toggles: MediaToggle,
    factory: F,
    relay: Arc<dyn RelaySink>,
    transport_tx: mpsc::Sender<TransportEvent<F::Track>>,
    transport_rx: mpsc::Receiver<TransportEvent<F::Track>>,
    render_tx: mpsc::UnboundedSender<RenderUpdate<F::Track>>,
}

impl<F: TransportFactory> MeshClient<F> {
    /// Acquire local media and enter the room. A denied capability aborts
    /// the attempt before any `join` frame is sent: every link needs
    /// attachable tracks.
    pub async fn join<M>(
        room: RoomId,
        media: &M,
        factory: F,
        relay: Arc<dyn RelaySink>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<RenderUpdate<F::Track>>), MeshError>
    where
        M: MediaSource<Stream = F::Stream>,
    {
        let local = media.start().await?;

        relay.send_join(room.clone()).await;

        let (transport_tx, transport_rx) = mpsc::channel(256);
        let (render_tx, render_rx) = mpsc::unbounded_channel();

        Ok((
            Self {
                room,
                local_sid: None,
                links: HashMap::new(),
                local,
                toggles: MediaToggle::new(),
                factory,
                relay,
                transport_tx,
                transport_rx,
                render_tx,
            },
            render_rx,
        ))
    }

    pub fn room(&self) -> &RoomId {
        &self.room
    }

    /// Our relay-assigned id, once the `welcome` frame has been processed.
    pub fn local_sid(&self) -> Option<&SessionId> {
        self.local_sid.as_ref()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn link_phase(&self, sid: &SessionId) -> Option<LinkPhase> {
        self.links.get(sid).map(|l| l.phase())
    }

    /// Drive the mesh until the relay or command channel closes, or a
    /// `Leave` command arrives.
    pub async fn run(
        mut self,
        mut relay_rx: mpsc::Receiver<ServerEvent>,
        mut command_rx: mpsc::Receiver<MeshCommand>,
    ) {
        info!("Mesh event loop started");

        loop {
            tokio::select! {
                event = relay_rx.recv() => {
                    match event {
                        Some(ev) => self.process_relay_event(ev).await,
                        None => {
                            info!("Relay channel closed. Shutting down mesh.");
                            break;
                        }
                    }
                }

                Some(ev) = self.transport_rx.recv() => {
                    self.process_transport_event(ev).await;
                }

                cmd = command_rx.recv() => {
                    match cmd {
                        Some(c) => {
                            if !self.process_command(c) {
                                break;
                            }
                        }
                        None => {
                            info!("Command channel closed. Shutting down mesh.");
                            break;
                        }
                    }
                }
            }
        }

        self.shutdown().await;
        info!("Mesh event loop finished");
    }

    pub async fn process_relay_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::Welcome { sid } => {
                info!("Relay assigned session id {}", sid);
                self.local_sid = Some(sid);
            }

            ServerEvent::ExistingParticipants { sids } => {
                // The roster lists everyone who was here first; the burden
                // of reaching all of them is ours.
                for sid in sids {
                    self.offer_to(sid).await;
                }
            }

            ServerEvent::Signal {
                sender_sid,
                signal_data,
            } => {
                self.process_signal(sender_sid, signal_data).await;
            }

            ServerEvent::UserLeft { sid } => {
                let Some(mut link) = self.links.remove(&sid) else {
                    return;
                };
                info!("Peer {} left, tearing down its link", sid);
                link.close().await;
                let _ = self.render_tx.send(RenderUpdate::PeerRemoved { sid });
            }

            // Editor traffic shares the relay socket but belongs to the
            // editor collaborator, not the mesh.
            ServerEvent::CodeUpdate { .. } | ServerEvent::EditorStateChanged { .. } => {}
        }
    }

    pub async fn process_transport_event(&mut self, event: TransportEvent<F::Track>) {
        match event {
            TransportEvent::CandidateGenerated { sid, candidate } => {
                // Candidates for an already-departed peer die here.
                if self.links.contains_key(&sid) {
                    self.relay
                        .send_signal(sid, SignalData::IceCandidate { candidate })
                        .await;
                }
            }

            TransportEvent::TrackReceived { sid, track } => {
                if self.links.contains_key(&sid) {
                    let _ = self.render_tx.send(RenderUpdate::TrackAdded { sid, track });
                }
            }

            TransportEvent::Connected { sid } => {
                if let Some(link) = self.links.get_mut(&sid) {
                    link.mark_connected();
                }
            }
        }
    }

    /// Returns false when the loop should stop.
    pub fn process_command(&mut self, cmd: MeshCommand) -> bool {
        match cmd {
            MeshCommand::ToggleVideo => {
                self.apply_toggle(TrackKind::Video);
                true
            }
            MeshCommand::ToggleAudio => {
                self.apply_toggle(TrackKind::Audio);
                true
            }
            MeshCommand::Leave => false,
        }
    }

    async fn process_signal(&mut self, from: SessionId, data: SignalData) {
        match data {
            SignalData::Offer { sdp } => {
                if !self.links.contains_key(&from) && !self.open_link(&from).await {
                    return;
                }
                let result = {
                    let Some(link) = self.links.get_mut(&from) else {
                        return;
                    };
                    if link.phase() == LinkPhase::Offering {
                        // Join ordering assigns one initiator per pair, so
                        // this only happens on a misbehaving peer.
                        warn!("Ignoring offer from {} while our own offer is pending", from);
                        return;
                    }
                    link.accept_offer(sdp).await
                };
                match result {
                    Ok(answer) => {
                        self.relay
                            .send_signal(from, SignalData::Answer { sdp: answer })
                            .await;
                    }
                    Err(e) => warn!("Failed to answer offer from {}: {:?}", from, e),
                }
            }

            SignalData::Answer { sdp } => {
                let Some(link) = self.links.get_mut(&from) else {
                    warn!("Answer from unknown session {}", from);
                    return;
                };
                if link.phase() != LinkPhase::Offering {
                    warn!("Unexpected answer from {} in phase {:?}", from, link.phase());
                    return;
                }
                if let Err(e) = link.accept_answer(sdp).await {
                    warn!("Failed to apply answer from {}: {:?}", from, e);
                }
            }

            SignalData::IceCandidate { candidate } => {
                if !self.links.contains_key(&from) && !self.open_link(&from).await {
                    return;
                }
                let Some(link) = self.links.get_mut(&from) else {
                    return;
                };
                if let Err(e) = link.add_candidate(candidate).await {
                    warn!("Failed to add candidate from {}: {:?}", from, e);
                }
            }
        }
    }

    /// Initiator path toward one roster member: create the link, offer,
    /// send. A failure is confined to this remote id.
    async fn offer_to(&mut self, sid: SessionId) {
        if self.links.contains_key(&sid) {
            return;
        }
        if !self.open_link(&sid).await {
            return;
        }

        let offer = {
            let Some(link) = self.links.get_mut(&sid) else {
                return;
            };
            link.start_offer().await
        };

        match offer {
            Ok(sdp) => {
                self.relay
                    .send_signal(sid, SignalData::Offer { sdp })
                    .await;
            }
            Err(e) => {
                warn!("Failed to create offer for {}: {:?}", sid, e);
                if let Some(mut link) = self.links.remove(&sid) {
                    link.close().await;
                }
            }
        }
    }

    async fn open_link(&mut self, sid: &SessionId) -> bool {
        match self
            .factory
            .create(sid, &self.local, self.transport_tx.clone())
            .await
        {
            Ok(transport) => {
                self.links
                    .insert(sid.clone(), PeerLink::new(sid.clone(), transport));
                true
            }
            Err(e) => {
                warn!("Failed to create transport for {}: {:?}", sid, e);
                false
            }
        }
    }

    fn apply_toggle(&mut self, kind: TrackKind) {
        let enabled = self.toggles.toggle(kind);
        // Mutes the shared track everywhere at once; no signaling follows.
        self.local.set_enabled(kind, enabled);
        info!("Local {:?} {}", kind, if enabled { "enabled" } else { "disabled" });
    }

    async fn shutdown(&mut self) {
        let links: Vec<_> = self.links.drain().collect();
        for (_, mut link) in links {
            link.close().await;
        }
    }
}
