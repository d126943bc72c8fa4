use crate::error::MeshError;
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

/// The capture capability. `start` failure means the user has no usable
/// camera/microphone; the caller must not enter the mesh without one.
#[async_trait]
pub trait MediaSource: Send + Sync {
    type Stream: LocalStream;

    async fn start(&self) -> Result<Self::Stream, MeshError>;
}

/// Handle to the shared local stream. Every transport is fed from the same
/// stream, so enabling/disabling a kind mutes it mesh-wide at once without
/// detaching anything from a connection.
pub trait LocalStream: Clone + Send + Sync + 'static {
    fn set_enabled(&self, kind: TrackKind, enabled: bool);
    fn is_enabled(&self, kind: TrackKind) -> bool;
}

/// Local mute state. Both kinds start enabled; a toggle flips one kind and
/// never triggers renegotiation.
#[derive(Debug, Clone, Copy)]
pub struct MediaToggle {
    video: bool,
    audio: bool,
}

impl MediaToggle {
    pub fn new() -> Self {
        Self {
            video: true,
            audio: true,
        }
    }

    /// Flip one kind, returning the new enablement.
    pub fn toggle(&mut self, kind: TrackKind) -> bool {
        match kind {
            TrackKind::Video => {
                self.video = !self.video;
                self.video
            }
            TrackKind::Audio => {
                self.audio = !self.audio;
                self.audio
            }
        }
    }

    pub fn enabled(&self, kind: TrackKind) -> bool {
        match kind {
            TrackKind::Video => self.video,
            TrackKind::Audio => self.audio,
        }
    }
}

impl Default for MediaToggle {
    fn default() -> Self {
        Self::new()
    }
}
