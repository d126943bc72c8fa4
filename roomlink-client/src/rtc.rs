use crate::config::MeshConfig;
use crate::error::MeshError;
use crate::media::{LocalStream, MediaSource, TrackKind};
use crate::transport::{PeerTransport, TransportEvent, TransportFactory};
use anyhow::Result;
use async_trait::async_trait;
use roomlink_core::{IceCandidateInit, SdpKind, SessionDescription, SessionId};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tracing::debug;
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_remote::TrackRemote;

/// Shared local stream backed by sample tracks. Device capture lives
/// outside this crate: the embedder's capture pipeline writes samples and
/// consults the enablement flags, so a disabled kind is muted by gating
/// writes rather than by detaching the track from any connection.
#[derive(Clone)]
pub struct RtcLocalStream {
    video: Option<Arc<TrackLocalStaticSample>>,
    audio: Option<Arc<TrackLocalStaticSample>>,
    video_enabled: Arc<AtomicBool>,
    audio_enabled: Arc<AtomicBool>,
}

impl RtcLocalStream {
    pub fn new(
        video: Option<Arc<TrackLocalStaticSample>>,
        audio: Option<Arc<TrackLocalStaticSample>>,
    ) -> Self {
        Self {
            video,
            audio,
            video_enabled: Arc::new(AtomicBool::new(true)),
            audio_enabled: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn has_tracks(&self) -> bool {
        self.video.is_some() || self.audio.is_some()
    }

    pub fn tracks(&self) -> Vec<Arc<dyn TrackLocal + Send + Sync>> {
        let mut tracks: Vec<Arc<dyn TrackLocal + Send + Sync>> = Vec::new();
        if let Some(video) = &self.video {
            tracks.push(video.clone());
        }
        if let Some(audio) = &self.audio {
            tracks.push(audio.clone());
        }
        tracks
    }

    fn flag(&self, kind: TrackKind) -> &AtomicBool {
        match kind {
            TrackKind::Video => &self.video_enabled,
            TrackKind::Audio => &self.audio_enabled,
        }
    }
}

impl LocalStream for RtcLocalStream {
    fn set_enabled(&self, kind: TrackKind, enabled: bool) {
        self.flag(kind).store(enabled, Ordering::Relaxed);
    }

    fn is_enabled(&self, kind: TrackKind) -> bool {
        self.flag(kind).load(Ordering::Relaxed)
    }
}

/// Capture capability over pre-built sample tracks. This source only
/// vouches that a usable stream exists before the mesh is entered; an
/// empty stream is the native analogue of a permission refusal.
pub struct RtcMediaSource {
    stream: RtcLocalStream,
}

impl RtcMediaSource {
    pub fn new(stream: RtcLocalStream) -> Self {
        Self { stream }
    }
}

#[async_trait]
impl MediaSource for RtcMediaSource {
    type Stream = RtcLocalStream;

    async fn start(&self) -> Result<RtcLocalStream, MeshError> {
        if !self.stream.has_tracks() {
            return Err(MeshError::MediaDenied(
                "no capture tracks configured".to_string(),
            ));
        }
        Ok(self.stream.clone())
    }
}

pub struct RtcTransportFactory {
    config: MeshConfig,
}

impl RtcTransportFactory {
    pub fn new(config: MeshConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl TransportFactory for RtcTransportFactory {
    type Transport = RtcPeerTransport;
    type Track = Arc<TrackRemote>;
    type Stream = RtcLocalStream;

    async fn create(
        &self,
        remote: &SessionId,
        local: &RtcLocalStream,
        events: mpsc::Sender<TransportEvent<Arc<TrackRemote>>>,
    ) -> Result<RtcPeerTransport> {
        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut media_engine)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: self
                .config
                .ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        };

        let pc = Arc::new(api.new_peer_connection(rtc_config).await?);

        // Trickle ICE: hand every gathered candidate to the mesh loop,
        // one at a time, as discovered.
        let ice_tx = events.clone();
        let ice_sid = remote.clone();
        pc.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            let sid = ice_sid.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let candidate = IceCandidateInit {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_m_line_index: init.sdp_mline_index,
                };
                let _ = tx
                    .send(TransportEvent::CandidateGenerated { sid, candidate })
                    .await;
            })
        }));

        let track_tx = events.clone();
        let track_sid = remote.clone();
        pc.on_track(Box::new(move |track, _receiver, _transceiver| {
            let tx = track_tx.clone();
            let sid = track_sid.clone();

            Box::pin(async move {
                debug!("Remote track {} arrived from {}", track.id(), sid);
                let _ = tx.send(TransportEvent::TrackReceived { sid, track }).await;
            })
        }));

        let state_tx = events.clone();
        let state_sid = remote.clone();
        pc.on_peer_connection_state_change(Box::new(move |state: RTCPeerConnectionState| {
            let tx = state_tx.clone();
            let sid = state_sid.clone();

            Box::pin(async move {
                debug!("Peer connection state for {}: {:?}", sid, state);
                // Failure states are a recognized gap: no restart here.
                if state == RTCPeerConnectionState::Connected {
                    let _ = tx.send(TransportEvent::Connected { sid }).await;
                }
            })
        }));

        for track in local.tracks() {
            let _ = pc.add_track(track).await?;
        }

        Ok(RtcPeerTransport { pc })
    }
}

/// `webrtc`-crate connection toward one remote peer.
pub struct RtcPeerTransport {
    pc: Arc<RTCPeerConnection>,
}

#[async_trait]
impl PeerTransport for RtcPeerTransport {
    async fn create_offer(&self) -> Result<String> {
        let offer = self.pc.create_offer(None).await?;
        self.pc.set_local_description(offer.clone()).await?;
        Ok(offer.sdp)
    }

    async fn create_answer(&self) -> Result<String> {
        let answer = self.pc.create_answer(None).await?;
        self.pc.set_local_description(answer.clone()).await?;
        Ok(answer.sdp)
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()> {
        let desc = match desc.kind {
            SdpKind::Offer => RTCSessionDescription::offer(desc.sdp)?,
            SdpKind::Answer => RTCSessionDescription::answer(desc.sdp)?,
        };
        self.pc.set_remote_description(desc).await?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidateInit) -> Result<()> {
        self.pc
            .add_ice_candidate(RTCIceCandidateInit {
                candidate: candidate.candidate,
                sdp_mid: candidate.sdp_mid,
                sdp_mline_index: candidate.sdp_m_line_index,
                username_fragment: None,
            })
            .await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.pc.close().await?;
        Ok(())
    }
}
