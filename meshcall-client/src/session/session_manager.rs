use crate::media::LocalMedia;
use crate::negotiation::{EngineEvent, EngineEvents, EngineFactory, Role};
use crate::session::peer_session::{CloseReason, Effect, PeerSession, SessionEvent, SessionState};
use crate::view::VideoGrid;
use meshcall_core::{ClientRequest, InboundSignal, OutboundSignal, PeerId, ServerEvent};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

/// Owns one [`PeerSession`] per remote participant and the tiles showing them.
///
/// Driven by two inputs: events from the signaling server and events the
/// negotiation engines report. Outbound signals go to `outbound` in the order
/// the engines produced them. Reports from an engine whose session has since
/// closed are dropped, even if a new session for the same peer exists.
pub struct PeerSessionManager {
    my_id: Option<PeerId>,
    sessions: HashMap<PeerId, PeerSession>,
    factory: Arc<dyn EngineFactory>,
    media: LocalMedia,
    outbound: mpsc::UnboundedSender<ClientRequest>,
    engine_tx: mpsc::UnboundedSender<EngineEvent>,
    engine_rx: mpsc::UnboundedReceiver<EngineEvent>,
    next_generation: u64,
    grid: VideoGrid,
    view_tx: watch::Sender<VideoGrid>,
}

impl PeerSessionManager {
    pub fn new(
        factory: Arc<dyn EngineFactory>,
        media: LocalMedia,
        outbound: mpsc::UnboundedSender<ClientRequest>,
    ) -> Self {
        let (engine_tx, engine_rx) = mpsc::unbounded_channel();
        let (view_tx, _) = watch::channel(VideoGrid::new());

        Self {
            my_id: None,
            sessions: HashMap::new(),
            factory,
            media,
            outbound,
            engine_tx,
            engine_rx,
            next_generation: 0,
            grid: VideoGrid::new(),
            view_tx,
        }
    }

    /// Follow the video grid as it changes.
    pub fn subscribe(&self) -> watch::Receiver<VideoGrid> {
        self.view_tx.subscribe()
    }

    pub fn my_id(&self) -> Option<PeerId> {
        self.my_id
    }

    pub fn session(&self, remote: &PeerId) -> Option<&PeerSession> {
        self.sessions.get(remote)
    }

    pub fn session_state(&self, remote: &PeerId) -> Option<SessionState> {
        self.sessions.get(remote).map(PeerSession::state)
    }

    pub fn remote_ids(&self) -> Vec<PeerId> {
        self.sessions.keys().copied().collect()
    }

    /// Known remote participants plus ourselves.
    pub fn participant_count(&self) -> usize {
        self.sessions.len() + 1
    }

    pub fn grid(&self) -> &VideoGrid {
        &self.grid
    }

    pub async fn run(
        mut self,
        mut inbound: mpsc::UnboundedReceiver<ServerEvent>,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        info!("Session manager started");

        loop {
            tokio::select! {
                event = inbound.recv() => {
                    match event {
                        Some(e) => self.handle_server_event(e),
                        None => {
                            info!("Signaling connection closed");
                            break;
                        }
                    }
                }

                Some(report) = self.engine_rx.recv() => self.handle_engine_event(report),

                _ = &mut shutdown => break,
            }
        }

        self.close_all();
        info!("Session manager finished");
    }

    pub fn handle_server_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::Me(id) => {
                info!("Assigned id {}", id);
                self.my_id = Some(id);
            }

            ServerEvent::AllUsers(ids) => {
                info!("{} participant(s) already here", ids.len());
                for id in ids {
                    self.ensure_session(id, Role::Initiator);
                }
            }

            ServerEvent::UserJoined(id) => {
                info!("User {} joined", id.short());
                self.ensure_session(id, Role::Responder);
            }

            ServerEvent::UserLeft(id) => {
                info!("User {} left", id.short());
                self.handle_session_event(id, SessionEvent::Closed(CloseReason::Departed));
            }

            ServerEvent::Signal(InboundSignal { from, signal }) => {
                if self.ensure_session(from, Role::Responder) {
                    self.handle_session_event(from, SessionEvent::InboundSignal(signal));
                }
            }
        }
    }

    /// Route one event to the session for `remote` and carry out what it asks
    /// for. Events for unknown participants are dropped.
    pub fn handle_session_event(&mut self, remote: PeerId, event: SessionEvent) {
        let Some(session) = self.sessions.get_mut(&remote) else {
            debug!("No session for {}, dropping {:?}", remote, event);
            return;
        };

        match session.apply(event) {
            Effect::None => {}

            Effect::SendSignal(signal) => {
                let request = ClientRequest::Signal(OutboundSignal { to: remote, signal });
                if self.outbound.send(request).is_err() {
                    warn!("Signaling connection gone, signal for {} lost", remote);
                }
            }

            Effect::AttachStream(stream) => {
                info!("Media from {} is live", remote.short());
                self.grid.attach_stream(remote, stream);
                self.publish();
            }

            Effect::Teardown(reason) => {
                info!("Session with {} closed: {:?}", remote.short(), reason);
                self.sessions.remove(&remote);
                self.grid.remove(&remote);
                self.publish();
            }
        }
    }

    /// Pass an engine's report on to its session, unless that engine has
    /// been replaced or released.
    pub fn handle_engine_event(&mut self, report: EngineEvent) {
        let EngineEvent {
            remote,
            generation,
            event,
        } = report;

        match self.sessions.get(&remote) {
            Some(session) if session.generation() == generation => {
                self.handle_session_event(remote, event)
            }
            _ => debug!(
                "Dropping {:?} from retired engine {} for {}",
                event, generation, remote
            ),
        }
    }

    /// Handle every engine event already queued. Returns how many there were.
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(report) = self.engine_rx.try_recv() {
            self.handle_engine_event(report);
            handled += 1;
        }
        handled
    }

    /// Tear down every session.
    pub fn close_all(&mut self) {
        for remote in self.remote_ids() {
            self.handle_session_event(remote, SessionEvent::Closed(CloseReason::Shutdown));
        }
    }

    fn ensure_session(&mut self, remote: PeerId, role: Role) -> bool {
        if self.sessions.contains_key(&remote) {
            return true;
        }
        if self.my_id == Some(remote) {
            debug!("Not opening a session with ourselves");
            return false;
        }

        let generation = self.next_generation;
        self.next_generation += 1;
        let events = EngineEvents::new(remote, generation, self.engine_tx.clone());

        let engine = match self.factory.create(role, &self.media, events) {
            Ok(engine) => engine,
            Err(e) => {
                warn!("Could not start negotiation with {}: {}", remote, e);
                return false;
            }
        };

        debug!("Opening {:?} session with {} (engine {})", role, remote, generation);
        self.sessions
            .insert(remote, PeerSession::new(remote, role, generation, engine));
        self.grid.add_placeholder(remote);
        self.publish();
        true
    }

    fn publish(&self) {
        self.view_tx.send_replace(self.grid.clone());
    }
}

impl std::fmt::Debug for PeerSessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerSessionManager")
            .field("my_id", &self.my_id)
            .field("sessions", &self.sessions)
            .field("grid", &self.grid)
            .finish_non_exhaustive()
    }
}
