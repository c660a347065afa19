use crate::error::MediaError;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackKind::Audio => write!(f, "audio"),
            TrackKind::Video => write!(f, "video"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoConstraints {
    pub width: u32,
    pub height: u32,
}

/// What to ask the capture device for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaConstraints {
    pub video: Option<VideoConstraints>,
    pub audio: bool,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            video: Some(VideoConstraints {
                width: 640,
                height: 480,
            }),
            audio: true,
        }
    }
}

/// Handle to a locally captured track. Clones share the same flags.
#[derive(Debug, Clone)]
pub struct LocalTrack {
    id: String,
    kind: TrackKind,
    enabled: Arc<AtomicBool>,
    ended: Arc<AtomicBool>,
}

impl LocalTrack {
    pub fn new(kind: TrackKind) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            enabled: Arc::new(AtomicBool::new(true)),
            ended: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    /// A disabled track keeps flowing but carries silence / black frames.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn stop(&self) {
        self.ended.store(true, Ordering::SeqCst);
    }

    pub fn is_ended(&self) -> bool {
        self.ended.load(Ordering::SeqCst)
    }
}

/// The local camera/microphone stream shared with every peer connection.
#[derive(Debug, Clone)]
pub struct LocalMedia {
    stream_id: String,
    video: Option<LocalTrack>,
    audio: Option<LocalTrack>,
}

impl LocalMedia {
    pub fn new(video: Option<LocalTrack>, audio: Option<LocalTrack>) -> Self {
        Self {
            stream_id: Uuid::new_v4().to_string(),
            video,
            audio,
        }
    }

    pub fn stream_id(&self) -> &str {
        &self.stream_id
    }

    pub fn video_track(&self) -> Option<&LocalTrack> {
        self.video.as_ref()
    }

    pub fn audio_track(&self) -> Option<&LocalTrack> {
        self.audio.as_ref()
    }

    pub fn tracks(&self) -> impl Iterator<Item = &LocalTrack> {
        self.video.iter().chain(self.audio.iter())
    }

    pub fn stop(&self) {
        for track in self.tracks() {
            track.stop();
        }
    }
}

/// Capture backend. Asked once at start-up; a refusal is not retried.
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn acquire(&self, constraints: &MediaConstraints) -> Result<LocalMedia, MediaError>;
}

/// Source that hands out track handles without touching any device.
#[derive(Debug, Default, Clone, Copy)]
pub struct SyntheticMediaSource;

#[async_trait]
impl MediaSource for SyntheticMediaSource {
    async fn acquire(&self, constraints: &MediaConstraints) -> Result<LocalMedia, MediaError> {
        let video = constraints.video.map(|_| LocalTrack::new(TrackKind::Video));
        let audio = constraints.audio.then(|| LocalTrack::new(TrackKind::Audio));
        Ok(LocalMedia::new(video, audio))
    }
}

/// State of one on-screen toggle button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlIndicator {
    /// Highlighted while the track is muted.
    pub active: bool,
    pub label: &'static str,
}

/// Local mute switches. Flipping one only touches the track's `enabled`
/// flag; no peer connection is renegotiated.
#[derive(Debug, Clone)]
pub struct MediaControls {
    media: LocalMedia,
    video_enabled: bool,
    audio_enabled: bool,
}

impl MediaControls {
    pub fn new(media: LocalMedia) -> Self {
        let video_enabled = media.video_track().is_none_or(LocalTrack::is_enabled);
        let audio_enabled = media.audio_track().is_none_or(LocalTrack::is_enabled);
        Self {
            media,
            video_enabled,
            audio_enabled,
        }
    }

    pub fn toggle_video(&mut self) -> ControlIndicator {
        self.video_enabled = !self.video_enabled;
        if let Some(track) = self.media.video_track() {
            track.set_enabled(self.video_enabled);
        }
        info!("Local video {}", if self.video_enabled { "on" } else { "off" });
        self.video_indicator()
    }

    pub fn toggle_audio(&mut self) -> ControlIndicator {
        self.audio_enabled = !self.audio_enabled;
        if let Some(track) = self.media.audio_track() {
            track.set_enabled(self.audio_enabled);
        }
        info!("Local audio {}", if self.audio_enabled { "on" } else { "off" });
        self.audio_indicator()
    }

    pub fn video_indicator(&self) -> ControlIndicator {
        ControlIndicator {
            active: !self.video_enabled,
            label: if self.video_enabled {
                "Turn Off Video"
            } else {
                "Turn On Video"
            },
        }
    }

    pub fn audio_indicator(&self) -> ControlIndicator {
        ControlIndicator {
            active: !self.audio_enabled,
            label: if self.audio_enabled {
                "Turn Off Audio"
            } else {
                "Turn On Audio"
            },
        }
    }
}
