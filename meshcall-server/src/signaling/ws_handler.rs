use crate::roster::RosterHandle;
use crate::signaling::dispatcher::{dispatch, parse_request};
use crate::signaling::error::ClientRequestError;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(roster): State<RosterHandle>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, roster))
}

async fn handle_socket(socket: WebSocket, roster: RosterHandle) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let peer_id = match roster.connect(tx).await {
        Ok(id) => id,
        Err(e) => {
            error!("Could not register connection: {}", e);
            return;
        }
    };
    info!("New WebSocket connection: {}", peer_id);

    let mut send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize event for {}: {}", peer_id, e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let roster = roster.clone();

        async move {
            while let Some(frame) = receiver.next().await {
                let request = match parse_request(frame) {
                    Ok(Some(request)) => request,
                    Ok(None) => continue,
                    Err(ClientRequestError::Close) => {
                        info!("Connection closed by {}", peer_id);
                        break;
                    }
                    Err(ClientRequestError::Axum(e)) => {
                        warn!("Unrecoverable error with {}: {}", peer_id, e);
                        break;
                    }
                    Err(e) => {
                        warn!("Invalid frame from {}: {:?}", peer_id, e);
                        continue;
                    }
                };

                if let Err(e) = dispatch(&roster, peer_id, request).await {
                    error!("Roster died: {}", e);
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    if let Err(e) = roster.disconnect(peer_id).await {
        warn!("Could not deregister {}: {}", peer_id, e);
    }
    info!("WebSocket disconnected: {}", peer_id);
}
