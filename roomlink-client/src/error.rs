use thiserror::Error;

#[derive(Debug, Error)]
pub enum MeshError {
    /// Camera or microphone unavailable, or permission refused. Terminal
    /// for the join attempt: the mesh is never entered without a stream.
    #[error("local media unavailable: {0}")]
    MediaDenied(String),

    #[error("relay connection failed: {0}")]
    Socket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("malformed relay frame: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("relay connection closed")]
    RelayClosed,
}
