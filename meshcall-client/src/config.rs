use crate::media::MediaConstraints;
use meshcall_core::IceServerConfig;
use meshcall_core::utils::{DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2, SIGNALING_PATH};

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket URL of the signaling endpoint, e.g. `ws://localhost:3000/ws`.
    pub url: String,
    pub ice_servers: Vec<IceServerConfig>,
    pub media: MediaConstraints,
}

impl ClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ice_servers: default_ice_servers(),
            media: MediaConstraints::default(),
        }
    }

    /// Config for a server reachable at `host:port`.
    pub fn for_server(host: &str, port: u16) -> Self {
        Self::new(format!("ws://{host}:{port}{SIGNALING_PATH}"))
    }
}

pub fn default_ice_servers() -> Vec<IceServerConfig> {
    [DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2]
        .into_iter()
        .map(|url| IceServerConfig {
            urls: vec![url.to_owned()],
            username: None,
            credential: None,
        })
        .collect()
}
