use crate::config::ClientConfig;
use crate::connection::SignalingConnection;
use crate::error::ClientError;
use crate::media::{ControlIndicator, LocalMedia, MediaControls, MediaSource};
use crate::negotiation::{EngineFactory, WebRtcEngineFactory};
use crate::session::PeerSessionManager;
use crate::view::VideoGrid;
use meshcall_core::{PeerId, ServerEvent};
use std::sync::Arc;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{error, info};

/// A participant in the call.
///
/// Created by [`MeshClient::join`], which captures local media, connects to
/// the signaling server and starts the session manager in the background.
pub struct MeshClient {
    id: PeerId,
    media: LocalMedia,
    controls: MediaControls,
    view: watch::Receiver<VideoGrid>,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl MeshClient {
    /// Join using the `webrtc` crate for negotiation.
    pub async fn join_webrtc<S>(config: &ClientConfig, source: &S) -> Result<Self, ClientError>
    where
        S: MediaSource + ?Sized,
    {
        let factory = Arc::new(WebRtcEngineFactory::new(config.ice_servers.clone()));
        Self::join(config, source, factory).await
    }

    /// Capture media, connect and wait for the server to assign an id.
    ///
    /// Media failure is fatal: nothing is connected and the error is returned
    /// as [`ClientError::Media`].
    pub async fn join<S>(
        config: &ClientConfig,
        source: &S,
        factory: Arc<dyn EngineFactory>,
    ) -> Result<Self, ClientError>
    where
        S: MediaSource + ?Sized,
    {
        let media = match source.acquire(&config.media).await {
            Ok(media) => media,
            Err(e) => {
                error!("Could not access camera or microphone: {}", e);
                return Err(e.into());
            }
        };

        let connection = match SignalingConnection::connect(&config.url).await {
            Ok(connection) => connection,
            Err(e) => {
                media.stop();
                return Err(e);
            }
        };
        let (outbound, mut inbound) = connection.into_parts();

        let id = match inbound.recv().await {
            Some(ServerEvent::Me(id)) => id,
            _ => {
                media.stop();
                return Err(ClientError::NoIdentity);
            }
        };

        let mut manager = PeerSessionManager::new(factory, media.clone(), outbound);
        manager.handle_server_event(ServerEvent::Me(id));
        let view = manager.subscribe();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(manager.run(inbound, shutdown_rx));

        info!("Joined as {}", id);

        Ok(Self {
            id,
            controls: MediaControls::new(media.clone()),
            media,
            view,
            shutdown: Some(shutdown_tx),
            task,
        })
    }

    pub fn id(&self) -> PeerId {
        self.id
    }

    pub fn local_media(&self) -> &LocalMedia {
        &self.media
    }

    /// Current remote tiles; `changed()` fires on every update.
    pub fn view(&self) -> watch::Receiver<VideoGrid> {
        self.view.clone()
    }

    pub fn toggle_video(&mut self) -> ControlIndicator {
        self.controls.toggle_video()
    }

    pub fn toggle_audio(&mut self) -> ControlIndicator {
        self.controls.toggle_audio()
    }

    pub fn video_indicator(&self) -> ControlIndicator {
        self.controls.video_indicator()
    }

    pub fn audio_indicator(&self) -> ControlIndicator {
        self.controls.audio_indicator()
    }

    /// Close every session, stop local tracks and hang up.
    pub async fn leave(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Err(e) = (&mut self.task).await {
            error!("Session manager panicked: {}", e);
        }
        self.media.stop();
        info!("Left the call");
    }
}

impl std::fmt::Debug for MeshClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeshClient")
            .field("id", &self.id)
            .field("media", &self.media)
            .finish_non_exhaustive()
    }
}
