use crate::error::ClientError;
use futures::{SinkExt, StreamExt};
use meshcall_core::{ClientRequest, ServerEvent};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

/// WebSocket link to the signaling server, split into typed channels.
///
/// Requests sent on `outbound` are written in order; dropping every clone of
/// it closes the socket. `inbound` yields `None` once the server hangs up.
#[derive(Debug)]
pub struct SignalingConnection {
    pub outbound: mpsc::UnboundedSender<ClientRequest>,
    pub inbound: mpsc::UnboundedReceiver<ServerEvent>,
}

impl SignalingConnection {
    pub async fn connect(url: &str) -> Result<Self, ClientError> {
        let (ws, _response) = tokio_tungstenite::connect_async(url).await?;
        info!("Connected to signaling server at {}", url);

        let (mut sink, mut stream) = ws.split();
        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<ClientRequest>();
        let (inbound_tx, inbound) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Some(request) = outbound_rx.recv().await {
                let json = match serde_json::to_string(&request) {
                    Ok(json) => json,
                    Err(e) => {
                        error!("Failed to serialize request: {}", e);
                        continue;
                    }
                };
                if let Err(e) = sink.send(Message::Text(json.into())).await {
                    warn!("Signaling write failed: {}", e);
                    break;
                }
            }
            let _ = sink.close().await;
            debug!("Signaling writer finished");
        });

        tokio::spawn(async move {
            while let Some(frame) = stream.next().await {
                match frame {
                    Ok(Message::Text(text)) => match text.as_str().parse::<ServerEvent>() {
                        Ok(event) => {
                            if inbound_tx.send(event).is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("Invalid server event: {}", e),
                    },
                    Ok(Message::Close(_)) => {
                        info!("Signaling server closed the connection");
                        break;
                    }
                    Ok(_) => continue,
                    Err(e) => {
                        warn!("Signaling read failed: {}", e);
                        break;
                    }
                }
            }
            debug!("Signaling reader finished");
        });

        Ok(Self { outbound, inbound })
    }

    pub fn into_parts(
        self,
    ) -> (
        mpsc::UnboundedSender<ClientRequest>,
        mpsc::UnboundedReceiver<ServerEvent>,
    ) {
        (self.outbound, self.inbound)
    }
}
