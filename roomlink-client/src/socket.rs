use crate::error::MeshError;
use crate::relay::RelaySink;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use roomlink_core::{ClientEvent, RoomId, ServerEvent, SessionId, SignalData};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::warn;

/// WebSocket connection to the relay. Outbound events are serialized by a
/// pump task fed from an internal queue; inbound frames surface as typed
/// `ServerEvent`s on the returned channel.
pub struct RelaySocket {
    out_tx: mpsc::Sender<ClientEvent>,
}

impl RelaySocket {
    pub async fn connect(url: &str) -> Result<(Self, mpsc::Receiver<ServerEvent>), MeshError> {
        let (ws_stream, _) = connect_async(url).await?;
        let (mut write, mut read) = ws_stream.split();

        let (out_tx, mut out_rx) = mpsc::channel::<ClientEvent>(64);
        let (in_tx, in_rx) = mpsc::channel::<ServerEvent>(64);

        tokio::spawn(async move {
            while let Some(event) = out_rx.recv().await {
                let Ok(json) = serde_json::to_string(&event) else {
                    continue;
                };
                if write.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
        });

        tokio::spawn(async move {
            while let Some(msg) = read.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        match serde_json::from_str::<ServerEvent>(&text) {
                            Ok(event) => {
                                if in_tx.send(event).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => warn!("Invalid frame from relay: {:?}", e),
                        }
                    }
                    Ok(Message::Close(_)) | Err(_) => break,
                    Ok(_) => {}
                }
            }
        });

        Ok((Self { out_tx }, in_rx))
    }

    async fn send(&self, event: ClientEvent) {
        if self.out_tx.send(event).await.is_err() {
            warn!("Relay socket closed; dropping outbound event");
        }
    }
}

#[async_trait]
impl RelaySink for RelaySocket {
    async fn send_join(&self, room_id: RoomId) {
        self.send(ClientEvent::Join { room_id }).await;
    }

    async fn send_signal(&self, target_sid: SessionId, signal_data: SignalData) {
        self.send(ClientEvent::Signal {
            target_sid,
            signal_data,
        })
        .await;
    }
}
