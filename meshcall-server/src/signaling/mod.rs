mod dispatcher;
mod error;
mod ws_handler;

pub use error::{ClientRequestError, SignalingError};
pub use ws_handler::ws_handler;
