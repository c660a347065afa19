//! WebRTC signaling relay and native call client.
//!
//! `model` is always available. Enable `server` for the relay, `client` for
//! the call client, or `full` for both:
//!
//! ```toml
//! meshcall = { version = "0.1", features = ["server"] }
//! ```

pub use meshcall_core::model::PeerId;

pub mod model {
    pub use meshcall_core::model::*;
    pub use meshcall_core::utils::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use meshcall_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use meshcall_client::*;
}
