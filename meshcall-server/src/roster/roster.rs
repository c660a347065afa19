use crate::roster::roster_command::{PeerSender, RosterCommand};
use crate::roster::roster_handle::RosterHandle;
use crate::signaling::SignalingError;
use meshcall_core::{InboundSignal, PeerId, ServerEvent};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

const COMMAND_BUFFER: usize = 256;

/// Owner of the participant table.
///
/// Runs as a single task. Every mutation and the broadcast that goes with it
/// happen inside one `handle_command` call.
pub struct Roster {
    peers: HashMap<PeerId, PeerSender>,
    command_rx: mpsc::Receiver<RosterCommand>,
}

impl Roster {
    pub fn new(command_rx: mpsc::Receiver<RosterCommand>) -> Self {
        Self {
            peers: HashMap::new(),
            command_rx,
        }
    }

    /// Start a roster task and return the handle connections talk to.
    pub fn spawn() -> RosterHandle {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        tokio::spawn(Roster::new(command_rx).run());
        RosterHandle::new(command_tx)
    }

    pub async fn run(mut self) {
        info!("Roster event loop started");

        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd);
        }

        info!("Roster event loop finished ({} peers dropped)", self.peers.len());
    }

    fn handle_command(&mut self, cmd: RosterCommand) {
        match cmd {
            RosterCommand::Connect { sender, reply } => {
                let peer_id = self.add_peer(sender);
                if reply.send(peer_id).is_err() {
                    // The socket task went away before learning its id.
                    self.remove_peer(&peer_id);
                }
            }

            RosterCommand::Disconnect { peer_id } => self.remove_peer(&peer_id),

            RosterCommand::Signal { from, to, signal } => self.forward(from, to, signal),

            RosterCommand::Snapshot { reply } => {
                let _ = reply.send(self.peers.keys().copied().collect());
            }
        }
    }

    fn add_peer(&mut self, sender: PeerSender) -> PeerId {
        let mut peer_id = PeerId::new();
        while self.peers.contains_key(&peer_id) {
            peer_id = PeerId::new();
        }

        let others: Vec<PeerId> = self.peers.keys().copied().collect();

        queue(&sender, peer_id, ServerEvent::Me(peer_id));
        queue(&sender, peer_id, ServerEvent::AllUsers(others));
        self.broadcast(ServerEvent::UserJoined(peer_id));

        self.peers.insert(peer_id, sender);
        info!("Peer {} joined ({} connected)", peer_id, self.peers.len());

        peer_id
    }

    fn remove_peer(&mut self, peer_id: &PeerId) {
        if self.peers.remove(peer_id).is_none() {
            debug!("Peer {} already removed", peer_id);
            return;
        }

        info!("Peer {} left ({} connected)", peer_id, self.peers.len());
        self.broadcast(ServerEvent::UserLeft(*peer_id));
    }

    fn forward(&self, from: PeerId, to: PeerId, signal: Value) {
        let event = ServerEvent::Signal(InboundSignal { from, signal });

        match self.try_send_to_peer(&to, event) {
            Ok(()) => debug!("Signal {} -> {}", from, to),
            Err(SignalingError::UnknownPeer) => {
                debug!("Dropping signal {} -> {}: recipient not connected", from, to)
            }
            Err(e) => error!("Failed to forward signal {} -> {}: {}", from, to, e),
        }
    }

    fn broadcast(&self, event: ServerEvent) {
        for (peer_id, sender) in &self.peers {
            queue(sender, *peer_id, event.clone());
        }
    }

    fn try_send_to_peer(&self, peer_id: &PeerId, event: ServerEvent) -> Result<(), SignalingError> {
        self.peers
            .get(peer_id)
            .ok_or(SignalingError::UnknownPeer)
            .and_then(|sender| try_send(sender, event))
    }
}

fn queue(sender: &PeerSender, peer_id: PeerId, event: ServerEvent) {
    if let Err(e) = try_send(sender, event) {
        error!("Failed to queue event for {}: {}", peer_id, e);
    }
}

fn try_send(sender: &PeerSender, event: ServerEvent) -> Result<(), SignalingError> {
    sender.send(event).map_err(SignalingError::from)
}
