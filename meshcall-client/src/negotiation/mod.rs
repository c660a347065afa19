mod sample_pump;
mod webrtc_engine;

pub use webrtc_engine::{WebRtcEngine, WebRtcEngineFactory};

use crate::error::NegotiationError;
use crate::media::{LocalMedia, TrackKind};
use crate::session::SessionEvent;
use meshcall_core::PeerId;
use serde_json::Value;
use tokio::sync::mpsc;

/// Which side creates the offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Initiator,
    Responder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrack {
    pub id: String,
    pub kind: TrackKind,
}

/// Media arriving from a remote participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteStream {
    pub id: String,
    pub tracks: Vec<RemoteTrack>,
}

/// One report from an engine, tagged with the engine that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineEvent {
    pub remote: PeerId,
    /// Distinguishes successive engines for the same remote participant.
    pub generation: u64,
    pub event: SessionEvent,
}

/// Where an engine reports what it produces.
#[derive(Debug, Clone)]
pub struct EngineEvents {
    remote: PeerId,
    generation: u64,
    tx: mpsc::UnboundedSender<EngineEvent>,
}

impl EngineEvents {
    pub fn new(remote: PeerId, generation: u64, tx: mpsc::UnboundedSender<EngineEvent>) -> Self {
        Self {
            remote,
            generation,
            tx,
        }
    }

    pub fn remote(&self) -> PeerId {
        self.remote
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns `false` once nobody listens any more.
    pub fn emit(&self, event: SessionEvent) -> bool {
        self.tx
            .send(EngineEvent {
                remote: self.remote,
                generation: self.generation,
                event,
            })
            .is_ok()
    }
}

/// One peer connection's negotiation machinery.
///
/// Engines report back only through [`EngineEvents`]: `LocalSignal` for every
/// payload that must reach the remote side, `StreamEstablished` once media
/// flows, and `Closed` on failure or remote hang-up.
pub trait NegotiationEngine: Send {
    /// Hand over a payload the remote side produced. Must return promptly.
    fn signal(&mut self, payload: Value);

    /// Release the connection. Called once, when the session closes.
    fn destroy(&mut self);
}

pub trait EngineFactory: Send + Sync {
    /// Start negotiating with `events.remote()`.
    fn create(
        &self,
        role: Role,
        media: &LocalMedia,
        events: EngineEvents,
    ) -> Result<Box<dyn NegotiationEngine>, NegotiationError>;
}
