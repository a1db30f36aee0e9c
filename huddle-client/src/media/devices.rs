use crate::error::MediaAccessError;
use crate::media::{LocalStream, LocalTrack, TrackKind};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoConstraints {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioConstraints {
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
}

/// What to capture. `None` leaves that kind out of the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaConstraints {
    pub video: Option<VideoConstraints>,
    pub audio: Option<AudioConstraints>,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            video: Some(VideoConstraints {
                width: 1280,
                height: 720,
            }),
            audio: Some(AudioConstraints {
                echo_cancellation: true,
                noise_suppression: true,
            }),
        }
    }
}

/// Source of local capture streams.
#[async_trait]
pub trait MediaDevices: Send + Sync {
    async fn open(&self, constraints: &MediaConstraints) -> Result<LocalStream, MediaAccessError>;
}

/// Builds Opus and VP8 sample tracks that the application feeds with
/// already-encoded frames through [`LocalTrack::write_sample`].
#[derive(Debug, Clone, Default)]
pub struct SampleDevices;

impl SampleDevices {
    fn track(kind: TrackKind, stream_id: &str) -> Arc<LocalTrack> {
        let (prefix, capability) = match kind {
            TrackKind::Audio => (
                "audio",
                RTCRtpCodecCapability {
                    mime_type: MIME_TYPE_OPUS.to_owned(),
                    clock_rate: 48000,
                    channels: 2,
                    sdp_fmtp_line: "minptime=10;useinbandfec=1".to_owned(),
                    rtcp_feedback: vec![],
                },
            ),
            TrackKind::Video => (
                "video",
                RTCRtpCodecCapability {
                    mime_type: MIME_TYPE_VP8.to_owned(),
                    clock_rate: 90000,
                    channels: 0,
                    sdp_fmtp_line: String::new(),
                    rtcp_feedback: vec![],
                },
            ),
        };

        let id = format!("{prefix}-{}", Uuid::new_v4().simple());
        let rtc = Arc::new(TrackLocalStaticSample::new(
            capability,
            id.clone(),
            stream_id.to_owned(),
        ));

        Arc::new(LocalTrack::new(id, kind, rtc))
    }
}

#[async_trait]
impl MediaDevices for SampleDevices {
    async fn open(&self, constraints: &MediaConstraints) -> Result<LocalStream, MediaAccessError> {
        if constraints.audio.is_none() && constraints.video.is_none() {
            return Err(MediaAccessError::Unavailable(
                "neither audio nor video requested".to_string(),
            ));
        }

        let stream_id = format!("huddle-{}", Uuid::new_v4().simple());
        let mut tracks = Vec::with_capacity(2);

        if constraints.audio.is_some() {
            tracks.push(Self::track(TrackKind::Audio, &stream_id));
        }
        if let Some(video) = &constraints.video {
            debug!("Opening {}x{} video track", video.width, video.height);
            tracks.push(Self::track(TrackKind::Video, &stream_id));
        }

        Ok(LocalStream::new(stream_id, tracks))
    }
}
