mod client;
mod config;
mod connection;
mod error;
pub mod media;
pub mod negotiation;
pub mod session;
pub mod view;

pub use client::MeshClient;
pub use config::ClientConfig;
pub use connection::SignalingConnection;
pub use error::{ClientError, MediaError, NegotiationError};
pub use media::{
    ControlIndicator, LocalMedia, LocalTrack, MediaConstraints, MediaControls, MediaSource,
    SyntheticMediaSource, TrackKind,
};
pub use negotiation::{
    EngineEvent, EngineEvents, EngineFactory, NegotiationEngine, RemoteStream, Role,
    WebRtcEngineFactory,
};
pub use session::{
    CloseReason, Effect, PeerSession, PeerSessionManager, SessionEvent, SessionState,
};
pub use view::{Tile, TileState, VideoGrid};
