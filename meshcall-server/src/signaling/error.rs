use meshcall_core::ServerEvent;
use tokio::sync::mpsc::error::SendError;

/// An error derived from a client's frame.
#[derive(Debug, thiserror::Error)]
pub enum ClientRequestError {
    #[error("axum error")]
    Axum(#[from] axum::Error),
    #[error("connection closed by client")]
    Close,
    #[error("malformed frame")]
    Json(#[from] serde_json::Error),
    #[error("unsupported message type")]
    UnsupportedType,
}

/// An error in relay logic.
#[derive(Debug, thiserror::Error)]
pub enum SignalingError {
    #[error("unknown recipient peer")]
    UnknownPeer,
    #[error("undeliverable event")]
    Undeliverable(#[from] SendError<ServerEvent>),
    #[error("roster task is gone")]
    RosterClosed,
}
