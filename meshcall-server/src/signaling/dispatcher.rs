use crate::roster::RosterHandle;
use crate::signaling::error::{ClientRequestError, SignalingError};
use axum::extract::ws::Message;
use meshcall_core::{ClientRequest, OutboundSignal, PeerId};

/// Decode one WebSocket frame. Control frames yield `Ok(None)`.
pub(crate) fn parse_request(
    frame: Result<Message, axum::Error>,
) -> Result<Option<ClientRequest>, ClientRequestError> {
    match frame? {
        Message::Text(text) => Ok(Some(text.as_str().parse()?)),
        Message::Close(_) => Err(ClientRequestError::Close),
        Message::Ping(_) | Message::Pong(_) => Ok(None),
        Message::Binary(_) => Err(ClientRequestError::UnsupportedType),
    }
}

/// Route a request from `sender`. The sender id comes from the connection, not the frame.
pub(crate) async fn dispatch(
    roster: &RosterHandle,
    sender: PeerId,
    request: ClientRequest,
) -> Result<(), SignalingError> {
    match request {
        ClientRequest::Signal(OutboundSignal { to, signal }) => {
            roster.signal(sender, to, signal).await
        }
    }
}
