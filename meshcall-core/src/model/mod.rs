mod peer;
mod signaling;

pub use peer::{PeerId, PeerIdError};
pub use signaling::{ClientRequest, IceServerConfig, InboundSignal, OutboundSignal, ServerEvent};
