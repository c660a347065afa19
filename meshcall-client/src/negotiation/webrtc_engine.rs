use crate::error::NegotiationError;
use crate::media::{LocalMedia, TrackKind};
use crate::negotiation::sample_pump;
use crate::negotiation::{
    EngineEvents, EngineFactory, NegotiationEngine, RemoteStream, RemoteTrack, Role,
};
use crate::session::{CloseReason, SessionEvent};
use meshcall_core::{IceServerConfig, PeerId};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8, MediaEngine};
use webrtc::ice_transport::ice_candidate::RTCIceCandidateInit;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::rtp_transceiver::rtp_codec::{RTCRtpCodecCapability, RTPCodecType};
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_remote::TrackRemote;

/// Payloads exchanged between two webrtc engines. Descriptions are sent
/// after ICE gathering completes, so candidates only arrive from peers that
/// trickle.
#[derive(Deserialize)]
#[serde(untagged)]
enum SignalPayload {
    Description(RTCSessionDescription),
    Candidate { candidate: RTCIceCandidateInit },
}

enum EngineCommand {
    Signal(Value),
    Destroy,
}

/// Builds peer connections with the `webrtc` crate.
#[derive(Debug, Clone)]
pub struct WebRtcEngineFactory {
    ice_servers: Vec<IceServerConfig>,
}

impl WebRtcEngineFactory {
    pub fn new(ice_servers: Vec<IceServerConfig>) -> Self {
        Self { ice_servers }
    }
}

impl EngineFactory for WebRtcEngineFactory {
    fn create(
        &self,
        role: Role,
        media: &LocalMedia,
        events: EngineEvents,
    ) -> Result<Box<dyn NegotiationEngine>, NegotiationError> {
        let (commands, command_rx) = mpsc::unbounded_channel();

        let worker = Worker {
            remote: events.remote(),
            role,
            ice_servers: self.ice_servers.clone(),
            media: media.clone(),
            events,
        };
        tokio::spawn(worker.run(command_rx));

        Ok(Box::new(WebRtcEngine { commands }))
    }
}

/// Front half of a webrtc peer connection. The connection itself lives in a
/// worker task that applies remote payloads strictly in arrival order.
pub struct WebRtcEngine {
    commands: mpsc::UnboundedSender<EngineCommand>,
}

impl NegotiationEngine for WebRtcEngine {
    fn signal(&mut self, payload: Value) {
        let _ = self.commands.send(EngineCommand::Signal(payload));
    }

    fn destroy(&mut self) {
        let _ = self.commands.send(EngineCommand::Destroy);
    }
}

struct Worker {
    remote: PeerId,
    role: Role,
    ice_servers: Vec<IceServerConfig>,
    media: LocalMedia,
    events: EngineEvents,
}

impl Worker {
    async fn run(self, mut commands: mpsc::UnboundedReceiver<EngineCommand>) {
        let (stop_pumps, pumps_stopped) = watch::channel(false);

        let pc = match self.build_peer_connection(pumps_stopped).await {
            Ok(pc) => pc,
            Err(e) => {
                self.fail(e);
                return;
            }
        };

        let offered = match self.role {
            Role::Initiator => self.send_offer(&pc).await,
            Role::Responder => Ok(()),
        };

        if let Err(e) = offered {
            self.fail(e);
        } else {
            while let Some(cmd) = commands.recv().await {
                match cmd {
                    EngineCommand::Signal(payload) => {
                        if let Err(e) = self.apply_remote(&pc, payload).await {
                            self.fail(e);
                            break;
                        }
                    }
                    EngineCommand::Destroy => break,
                }
            }
        }

        // Nothing may be reported once the session let go of this engine.
        silence(&pc);
        stop_pumps.send_replace(true);

        if let Err(e) = pc.close().await {
            debug!("Closing peer connection to {} failed: {}", self.remote, e);
        }
        debug!("Engine for {} stopped", self.remote);
    }

    async fn build_peer_connection(
        &self,
        pumps_stopped: watch::Receiver<bool>,
    ) -> Result<Arc<RTCPeerConnection>, NegotiationError> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: self
                .ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        };

        let pc = Arc::new(api.new_peer_connection(rtc_config).await?);

        for track in self.media.tracks() {
            let mime_type = match track.kind() {
                TrackKind::Video => MIME_TYPE_VP8,
                TrackKind::Audio => MIME_TYPE_OPUS,
            };
            let local = Arc::new(TrackLocalStaticSample::new(
                RTCRtpCodecCapability {
                    mime_type: mime_type.to_owned(),
                    ..Default::default()
                },
                track.id().to_owned(),
                self.media.stream_id().to_owned(),
            ));
            pc.add_track(local.clone() as Arc<dyn TrackLocal + Send + Sync>)
                .await?;

            tokio::spawn(sample_pump::run(track.clone(), local, pumps_stopped.clone()));
        }

        let events = self.events.clone();
        let remote = self.remote;
        pc.on_track(Box::new(
            move |track: Arc<TrackRemote>, _: Arc<RTCRtpReceiver>, _: Arc<RTCRtpTransceiver>| {
                let events = events.clone();
                Box::pin(async move {
                    let kind = match track.kind() {
                        RTPCodecType::Audio => TrackKind::Audio,
                        _ => TrackKind::Video,
                    };
                    let stream = RemoteStream {
                        id: track.stream_id(),
                        tracks: vec![RemoteTrack {
                            id: track.id(),
                            kind,
                        }],
                    };
                    events.emit(SessionEvent::StreamEstablished(stream));
                })
            },
        ));

        let events = self.events.clone();
        pc.on_peer_connection_state_change(Box::new(move |s: RTCPeerConnectionState| {
            let events = events.clone();
            Box::pin(async move {
                info!("Peer connection to {} is {:?}", remote, s);
                let reason = match s {
                    RTCPeerConnectionState::Failed => {
                        CloseReason::Failed("ICE connection failed".to_owned())
                    }
                    RTCPeerConnectionState::Closed => CloseReason::ClosedByPeer,
                    _ => return,
                };
                events.emit(SessionEvent::Closed(reason));
            })
        }));

        Ok(pc)
    }

    async fn send_offer(&self, pc: &RTCPeerConnection) -> Result<(), NegotiationError> {
        let offer = pc.create_offer(None).await?;
        self.publish_local(pc, offer).await
    }

    async fn apply_remote(&self, pc: &RTCPeerConnection, payload: Value) -> Result<(), NegotiationError> {
        match serde_json::from_value(payload)? {
            SignalPayload::Description(desc) => {
                let is_offer = desc.sdp_type == RTCSdpType::Offer;
                pc.set_remote_description(desc).await?;

                if is_offer {
                    let answer = pc.create_answer(None).await?;
                    self.publish_local(pc, answer).await?;
                }
            }
            SignalPayload::Candidate { candidate } => {
                pc.add_ice_candidate(candidate).await?;
            }
        }
        Ok(())
    }

    /// Set `desc` locally, wait for ICE gathering and emit the complete description.
    async fn publish_local(
        &self,
        pc: &RTCPeerConnection,
        desc: RTCSessionDescription,
    ) -> Result<(), NegotiationError> {
        let mut gathering = pc.gathering_complete_promise().await;
        pc.set_local_description(desc).await?;
        let _ = gathering.recv().await;

        let local = pc
            .local_description()
            .await
            .ok_or(NegotiationError::MissingDescription)?;

        let payload = serde_json::to_value(&local)?;
        self.events.emit(SessionEvent::LocalSignal(payload));
        Ok(())
    }

    fn fail(&self, error: NegotiationError) {
        warn!("Negotiation with {} failed: {}", self.remote, error);
        self.events
            .emit(SessionEvent::Closed(CloseReason::Failed(error.to_string())));
    }
}

/// Drop the track and state callbacks so closing reports nothing.
fn silence(pc: &RTCPeerConnection) {
    pc.on_track(Box::new(
        |_: Arc<TrackRemote>, _: Arc<RTCRtpReceiver>, _: Arc<RTCRtpTransceiver>| {
            Box::pin(async {})
        },
    ));
    pc.on_peer_connection_state_change(Box::new(|_: RTCPeerConnectionState| Box::pin(async {})));
}
