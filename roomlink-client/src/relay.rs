use async_trait::async_trait;
use roomlink_core::{RoomId, SessionId, SignalData};

/// Outbound half of the relay connection, as the mesh loop sees it.
/// Delivery is fire-and-forget: the relay drops envelopes for departed
/// targets and nothing comes back to tell us.
#[async_trait]
pub trait RelaySink: Send + Sync {
    async fn send_join(&self, room_id: RoomId);

    async fn send_signal(&self, target_sid: SessionId, signal_data: SignalData);
}
