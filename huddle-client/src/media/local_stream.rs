use crate::error::MediaAccessError;
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use webrtc::media::Sample;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

/// One captured track. Shared by every peer connection it is attached to.
pub struct LocalTrack {
    id: String,
    kind: TrackKind,
    enabled: AtomicBool,
    stopped: AtomicBool,
    rtc: Arc<TrackLocalStaticSample>,
}

impl LocalTrack {
    pub fn new(id: impl Into<String>, kind: TrackKind, rtc: Arc<TrackLocalStaticSample>) -> Self {
        Self {
            id: id.into(),
            kind,
            enabled: AtomicBool::new(true),
            stopped: AtomicBool::new(false),
            rtc,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn rtc(&self) -> Arc<TrackLocalStaticSample> {
        Arc::clone(&self.rtc)
    }

    // Only the media controller flips this.
    pub(crate) fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub(crate) fn stop(&self) -> bool {
        !self.stopped.swap(true, Ordering::SeqCst)
    }

    /// Feed one encoded frame. Frames written while the track is disabled are dropped.
    pub async fn write_sample(&self, data: Bytes, duration: Duration) -> Result<(), MediaAccessError> {
        if self.is_stopped() {
            return Err(MediaAccessError::TrackStopped);
        }
        if !self.is_enabled() {
            return Ok(());
        }

        let sample = Sample {
            data,
            duration,
            timestamp: std::time::SystemTime::now(),
            ..Default::default()
        };

        // No bound peer connection yet is not an error for the capture side.
        if let Err(e) = self.rtc.write_sample(&sample).await {
            tracing::trace!("Sample on {} not delivered: {}", self.id, e);
        }
        Ok(())
    }
}

impl fmt::Debug for LocalTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalTrack")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("enabled", &self.is_enabled())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

/// The local capture stream: one audio and one video track in practice.
#[derive(Debug, Clone)]
pub struct LocalStream {
    id: String,
    tracks: Vec<Arc<LocalTrack>>,
}

impl LocalStream {
    pub fn new(id: impl Into<String>, tracks: Vec<Arc<LocalTrack>>) -> Self {
        Self {
            id: id.into(),
            tracks,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn tracks(&self) -> &[Arc<LocalTrack>] {
        &self.tracks
    }

    pub fn audio_tracks(&self) -> impl Iterator<Item = &Arc<LocalTrack>> {
        self.tracks.iter().filter(|t| t.kind() == TrackKind::Audio)
    }

    pub fn video_tracks(&self) -> impl Iterator<Item = &Arc<LocalTrack>> {
        self.tracks.iter().filter(|t| t.kind() == TrackKind::Video)
    }

    pub fn audio_enabled(&self) -> bool {
        self.audio_tracks().any(|t| t.is_enabled())
    }

    pub fn video_enabled(&self) -> bool {
        self.video_tracks().any(|t| t.is_enabled())
    }
}
