use crate::roster::roster_command::{PeerSender, RosterCommand};
use crate::signaling::SignalingError;
use meshcall_core::PeerId;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

/// Cheap, cloneable front door to the roster task.
#[derive(Clone, Debug)]
pub struct RosterHandle {
    command_tx: mpsc::Sender<RosterCommand>,
}

impl RosterHandle {
    pub fn new(command_tx: mpsc::Sender<RosterCommand>) -> Self {
        Self { command_tx }
    }

    /// Register a connection. The roster queues `me` and `allUsers` on `sender`
    /// and announces the new id to everyone else before this returns.
    pub async fn connect(&self, sender: PeerSender) -> Result<PeerId, SignalingError> {
        let (reply, rx) = oneshot::channel();
        self.command(RosterCommand::Connect { sender, reply }).await?;
        rx.await.map_err(|_| SignalingError::RosterClosed)
    }

    pub async fn disconnect(&self, peer_id: PeerId) -> Result<(), SignalingError> {
        self.command(RosterCommand::Disconnect { peer_id }).await
    }

    pub async fn signal(&self, from: PeerId, to: PeerId, signal: Value) -> Result<(), SignalingError> {
        self.command(RosterCommand::Signal { from, to, signal }).await
    }

    pub async fn snapshot(&self) -> Result<Vec<PeerId>, SignalingError> {
        let (reply, rx) = oneshot::channel();
        self.command(RosterCommand::Snapshot { reply }).await?;
        rx.await.map_err(|_| SignalingError::RosterClosed)
    }

    async fn command(&self, cmd: RosterCommand) -> Result<(), SignalingError> {
        self.command_tx
            .send(cmd)
            .await
            .map_err(|_| SignalingError::RosterClosed)
    }
}
