use crate::media::{LocalTrack, TrackKind};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};
use webrtc::media::Sample;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

const VIDEO_FRAME_INTERVAL: Duration = Duration::from_millis(33);
const AUDIO_FRAME_INTERVAL: Duration = Duration::from_millis(20);

static VIDEO_FRAME: [u8; 64] = [0x9d; 64];
static BLACK_FRAME: [u8; 64] = [0x00; 64];
static AUDIO_FRAME: [u8; 40] = [0x78; 40];
/// Opus TOC byte plus an empty frame; decodes to silence.
static SILENT_FRAME: [u8; 3] = [0xf8, 0xff, 0xfe];

pub(crate) fn frame_interval(kind: TrackKind) -> Duration {
    match kind {
        TrackKind::Video => VIDEO_FRAME_INTERVAL,
        TrackKind::Audio => AUDIO_FRAME_INTERVAL,
    }
}

/// Next payload for `track`. Muted tracks keep sending, but black or silent.
pub(crate) fn next_frame(track: &LocalTrack) -> Bytes {
    match (track.kind(), track.is_enabled()) {
        (TrackKind::Video, true) => Bytes::from_static(&VIDEO_FRAME),
        (TrackKind::Video, false) => Bytes::from_static(&BLACK_FRAME),
        (TrackKind::Audio, true) => Bytes::from_static(&AUDIO_FRAME),
        (TrackKind::Audio, false) => Bytes::from_static(&SILENT_FRAME),
    }
}

/// Feed `local` with frames from `track` until the track ends or `stop` fires.
pub(crate) async fn run(
    track: LocalTrack,
    local: Arc<TrackLocalStaticSample>,
    mut stop: watch::Receiver<bool>,
) {
    let duration = frame_interval(track.kind());
    let mut ticker = tokio::time::interval(duration);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = stop.changed() => break,
        }

        if track.is_ended() {
            debug!("Local {} track {} ended", track.kind(), track.id());
            break;
        }

        let sample = Sample {
            data: next_frame(&track),
            duration,
            ..Default::default()
        };
        if let Err(e) = local.write_sample(&sample).await {
            warn!("Writing {} sample failed: {}", track.kind(), e);
            break;
        }
    }
}
