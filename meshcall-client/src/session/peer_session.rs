use crate::negotiation::{NegotiationEngine, RemoteStream, Role};
use meshcall_core::PeerId;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Negotiating,
    Connected,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// The server announced that the participant left.
    Departed,
    /// The engine gave up.
    Failed(String),
    /// The remote side closed the peer connection.
    ClosedByPeer,
    /// This client is leaving.
    Shutdown,
}

/// Everything that can happen to a session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The local engine produced negotiation data for the remote side.
    LocalSignal(Value),
    /// The remote side's negotiation data arrived through the server.
    InboundSignal(Value),
    StreamEstablished(RemoteStream),
    Closed(CloseReason),
}

/// What the manager has to do after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    SendSignal(Value),
    AttachStream(RemoteStream),
    Teardown(CloseReason),
}

/// Negotiation state for one remote participant.
pub struct PeerSession {
    remote_id: PeerId,
    role: Role,
    generation: u64,
    state: SessionState,
    remote_stream: Option<RemoteStream>,
    engine: Box<dyn NegotiationEngine>,
}

impl PeerSession {
    pub fn new(
        remote_id: PeerId,
        role: Role,
        generation: u64,
        engine: Box<dyn NegotiationEngine>,
    ) -> Self {
        Self {
            remote_id,
            role,
            generation,
            state: SessionState::Negotiating,
            remote_stream: None,
            engine,
        }
    }

    pub fn remote_id(&self) -> PeerId {
        self.remote_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Generation of the engine this session drives.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn remote_stream(&self) -> Option<&RemoteStream> {
        self.remote_stream.as_ref()
    }

    /// Apply `event`. `Closed` is terminal: later events are ignored and the
    /// engine is destroyed exactly once.
    pub fn apply(&mut self, event: SessionEvent) -> Effect {
        if self.state == SessionState::Closed {
            debug!("Ignoring {:?} for closed session {}", event, self.remote_id);
            return Effect::None;
        }

        match event {
            SessionEvent::LocalSignal(payload) => Effect::SendSignal(payload),

            SessionEvent::InboundSignal(payload) => {
                self.engine.signal(payload);
                Effect::None
            }

            SessionEvent::StreamEstablished(stream) => {
                self.state = SessionState::Connected;
                let stream = match self.remote_stream.take() {
                    Some(mut current) if current.id == stream.id => {
                        for track in stream.tracks {
                            if !current.tracks.contains(&track) {
                                current.tracks.push(track);
                            }
                        }
                        current
                    }
                    _ => stream,
                };
                self.remote_stream = Some(stream.clone());
                Effect::AttachStream(stream)
            }

            SessionEvent::Closed(reason) => {
                self.state = SessionState::Closed;
                self.remote_stream = None;
                self.engine.destroy();
                Effect::Teardown(reason)
            }
        }
    }
}

impl std::fmt::Debug for PeerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerSession")
            .field("remote_id", &self.remote_id)
            .field("role", &self.role)
            .field("generation", &self.generation)
            .field("state", &self.state)
            .field("remote_stream", &self.remote_stream)
            .finish_non_exhaustive()
    }
}
