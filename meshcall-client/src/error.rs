use crate::media::TrackKind;

/// Failure to obtain local camera/microphone tracks. Fatal to client start-up.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("permission to use camera and microphone was denied")]
    PermissionDenied,
    #[error("no {0} device available")]
    DeviceNotFound(TrackKind),
    #[error("media capture failed: {0}")]
    Capture(String),
}

#[derive(Debug, thiserror::Error)]
pub enum NegotiationError {
    #[error("webrtc error")]
    WebRtc(#[from] webrtc::Error),
    #[error("malformed signal payload")]
    Payload(#[from] serde_json::Error),
    #[error("peer connection has no local description")]
    MissingDescription,
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("camera access is required: {0}")]
    Media(#[from] MediaError),
    #[error("could not reach signaling server")]
    Connect(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("signaling connection closed before an id was assigned")]
    NoIdentity,
}
