use crate::utils::SHORT_ID_LEN;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identifier the server assigns to a connection for its whole lifetime.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct PeerId(pub Uuid);

#[derive(Debug, thiserror::Error)]
#[error("invalid peer id `{input}`")]
pub struct PeerIdError {
    input: String,
    #[source]
    source: uuid::Error,
}

impl PeerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Leading characters of the id, used for on-screen labels.
    pub fn short(&self) -> String {
        self.0.simple().to_string().chars().take(SHORT_ID_LEN).collect()
    }
}

impl Default for PeerId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for PeerId {
    type Err = PeerIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self).map_err(|source| PeerIdError {
            input: s.to_owned(),
            source,
        })
    }
}

impl From<Uuid> for PeerId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
