use crate::error::MediaAccessError;
use crate::media::{LocalStream, MediaConstraints, MediaDevices};
use crate::signaling::SignalingOutput;
use huddle_core::{ClientMessage, StatusPatch};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Owns the local capture stream and the only writer of its enabled flags.
pub struct MediaController {
    devices: Arc<dyn MediaDevices>,
    constraints: MediaConstraints,
    stream: Option<LocalStream>,
    audio_enabled: bool,
    video_enabled: bool,
    signaling: Option<Arc<dyn SignalingOutput>>,
}

impl MediaController {
    pub fn new(devices: Arc<dyn MediaDevices>, constraints: MediaConstraints) -> Self {
        Self {
            devices,
            constraints,
            stream: None,
            audio_enabled: true,
            video_enabled: true,
            signaling: None,
        }
    }

    /// Open the capture stream, or hand back the one already open.
    pub async fn acquire(&mut self) -> Result<LocalStream, MediaAccessError> {
        if let Some(stream) = &self.stream {
            return Ok(stream.clone());
        }

        let stream = self.devices.open(&self.constraints).await?;
        for track in stream.audio_tracks() {
            track.set_enabled(self.audio_enabled);
        }
        for track in stream.video_tracks() {
            track.set_enabled(self.video_enabled);
        }

        info!(
            "Acquired local stream {} with {} tracks",
            stream.id(),
            stream.tracks().len()
        );
        self.stream = Some(stream.clone());
        Ok(stream)
    }

    /// Stop every track. Safe to call without a stream.
    pub fn release(&mut self) {
        self.signaling = None;
        self.audio_enabled = true;
        self.video_enabled = true;

        let Some(stream) = self.stream.take() else {
            return;
        };

        let stopped = stream.tracks().iter().filter(|t| t.stop()).count();
        info!("Released local stream {} ({} tracks stopped)", stream.id(), stopped);
    }

    pub fn stream(&self) -> Option<&LocalStream> {
        self.stream.as_ref()
    }

    pub fn has_stream(&self) -> bool {
        self.stream.is_some()
    }

    /// Channel used to announce mute and camera changes to the room.
    pub fn bind_signaling(&mut self, signaling: Arc<dyn SignalingOutput>) {
        self.signaling = Some(signaling);
    }

    pub fn audio_enabled(&self) -> bool {
        self.audio_enabled
    }

    pub fn video_enabled(&self) -> bool {
        self.video_enabled
    }

    pub fn is_muted(&self) -> bool {
        !self.audio_enabled
    }

    pub fn is_video_off(&self) -> bool {
        !self.video_enabled
    }

    /// Returns false when there is no stream to apply the change to.
    pub async fn set_audio_enabled(&mut self, enabled: bool) -> bool {
        let Some(stream) = &self.stream else {
            debug!("Ignoring audio toggle without a local stream");
            return false;
        };

        stream.audio_tracks().for_each(|t| t.set_enabled(enabled));
        self.audio_enabled = enabled;
        self.announce(StatusPatch::muted(!enabled)).await;
        true
    }

    pub async fn set_video_enabled(&mut self, enabled: bool) -> bool {
        let Some(stream) = &self.stream else {
            debug!("Ignoring video toggle without a local stream");
            return false;
        };

        stream.video_tracks().for_each(|t| t.set_enabled(enabled));
        self.video_enabled = enabled;
        self.announce(StatusPatch::video_off(!enabled)).await;
        true
    }

    /// Flip the microphone and return the new `is_muted`.
    pub async fn toggle_audio(&mut self) -> bool {
        self.set_audio_enabled(!self.audio_enabled).await;
        self.is_muted()
    }

    /// Flip the camera and return the new `is_video_off`.
    pub async fn toggle_video(&mut self) -> bool {
        self.set_video_enabled(!self.video_enabled).await;
        self.is_video_off()
    }

    async fn announce(&self, data: StatusPatch) {
        let Some(signaling) = &self.signaling else {
            return;
        };
        if let Err(e) = signaling.send(ClientMessage::ParticipantUpdate { data }).await {
            warn!("Could not announce media status: {}", e);
        }
    }
}
