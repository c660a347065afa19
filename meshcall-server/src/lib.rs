pub mod config;
mod roster;
mod server;
mod signaling;

pub use config::{ConfigError, ServerConfig};
pub use roster::*;
pub use server::{SignalingServer, router};
pub use signaling::*;
