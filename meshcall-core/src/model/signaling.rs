use crate::model::peer::PeerId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

/// Envelope as written by a client. Any `from` the client adds is not part of
/// the type and never reaches the recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundSignal {
    pub to: PeerId,
    pub signal: Value,
}

/// Envelope as delivered by the server, `from` stamped with the sender's connection id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundSignal {
    pub from: PeerId,
    pub signal: Value,
}

/// Frames a client may send to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "d", rename_all = "camelCase")]
pub enum ClientRequest {
    Signal(OutboundSignal),
}

/// Frames the server sends to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "d", rename_all = "camelCase")]
pub enum ServerEvent {
    /// First frame on every connection: the id assigned to the receiver.
    Me(PeerId),
    /// Everyone else connected at the time the receiver joined.
    AllUsers(Vec<PeerId>),
    UserJoined(PeerId),
    UserLeft(PeerId),
    Signal(InboundSignal),
}

macro_rules! json_frame {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", serde_json::to_string(self).map_err(|_| fmt::Error)?)
            }
        }

        impl FromStr for $ty {
            type Err = serde_json::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                serde_json::from_str(s)
            }
        }
    };
}

json_frame!(ClientRequest);
json_frame!(ServerEvent);
