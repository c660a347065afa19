use meshcall_core::{PeerId, ServerEvent};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

/// Outbound queue of a single connection. The connection's writer task drains it.
pub type PeerSender = mpsc::UnboundedSender<ServerEvent>;

/// Commands the connection handlers send to the roster actor.
#[derive(Debug)]
pub enum RosterCommand {
    /// A socket finished its upgrade. The roster assigns the id and replies with it.
    Connect {
        sender: PeerSender,
        reply: oneshot::Sender<PeerId>,
    },

    /// The socket is gone. Sending this more than once for the same id is harmless.
    Disconnect { peer_id: PeerId },

    /// Forward `signal` to `to`, stamped with `from`.
    Signal {
        from: PeerId,
        to: PeerId,
        signal: Value,
    },

    /// Ids of every open connection.
    Snapshot { reply: oneshot::Sender<Vec<PeerId>> },
}
