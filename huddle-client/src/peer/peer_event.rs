use crate::media::TrackKind;
use huddle_core::{ConnectionStatus, IceCandidate, ParticipantId};
use std::fmt;
use std::sync::Arc;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::track::track_remote::TrackRemote;

/// Events a peer connection reports back to the router.
#[derive(Debug, Clone)]
pub enum PeerEvent {
    /// The remote side started sending a track.
    TrackAdded(RemoteTrack),

    /// Local ICE candidate to trickle to the participant.
    CandidateGenerated(IceCandidate),

    StateChanged(LinkState),

    /// An offer stayed unanswered for too long.
    NegotiationTimeout { attempt: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

impl From<RTCPeerConnectionState> for LinkState {
    fn from(state: RTCPeerConnectionState) -> Self {
        match state {
            RTCPeerConnectionState::Unspecified | RTCPeerConnectionState::New => LinkState::New,
            RTCPeerConnectionState::Connecting => LinkState::Connecting,
            RTCPeerConnectionState::Connected => LinkState::Connected,
            RTCPeerConnectionState::Disconnected => LinkState::Disconnected,
            RTCPeerConnectionState::Failed => LinkState::Failed,
            RTCPeerConnectionState::Closed => LinkState::Closed,
        }
    }
}

impl LinkState {
    pub fn connection_status(self) -> ConnectionStatus {
        match self {
            LinkState::New | LinkState::Connecting => ConnectionStatus::Connecting,
            LinkState::Connected => ConnectionStatus::Connected,
            LinkState::Disconnected | LinkState::Failed | LinkState::Closed => {
                ConnectionStatus::Disconnected
            }
        }
    }
}

/// Inbound track from a participant.
#[derive(Clone)]
pub struct RemoteTrack {
    pub id: String,
    pub stream_id: String,
    pub kind: TrackKind,
    rtc: Option<Arc<TrackRemote>>,
}

impl RemoteTrack {
    pub fn new(id: impl Into<String>, stream_id: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            id: id.into(),
            stream_id: stream_id.into(),
            kind,
            rtc: None,
        }
    }

    pub(crate) fn from_rtc(track: Arc<TrackRemote>, kind: TrackKind) -> Self {
        Self {
            id: track.id(),
            stream_id: track.stream_id(),
            kind,
            rtc: Some(track),
        }
    }

    /// Underlying RTP track, for reading packets.
    pub fn rtc(&self) -> Option<Arc<TrackRemote>> {
        self.rtc.clone()
    }
}

impl fmt::Debug for RemoteTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteTrack")
            .field("id", &self.id)
            .field("stream_id", &self.stream_id)
            .field("kind", &self.kind)
            .finish()
    }
}

/// Everything received from one participant.
#[derive(Debug, Clone)]
pub struct RemoteStream {
    pub participant_id: ParticipantId,
    tracks: Vec<RemoteTrack>,
}

impl RemoteStream {
    pub fn new(participant_id: ParticipantId) -> Self {
        Self {
            participant_id,
            tracks: Vec::new(),
        }
    }

    pub fn add_track(&mut self, track: RemoteTrack) {
        self.tracks.retain(|t| t.id != track.id);
        self.tracks.push(track);
    }

    pub fn tracks(&self) -> &[RemoteTrack] {
        &self.tracks
    }

    pub fn has_kind(&self, kind: TrackKind) -> bool {
        self.tracks.iter().any(|t| t.kind == kind)
    }
}
