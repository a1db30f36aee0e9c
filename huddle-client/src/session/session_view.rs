use crate::peer::RemoteStream;
use crate::router::MessageRouter;
use chrono::{DateTime, Utc};
use huddle_core::{Participant, ParticipantId, RoomId, RoomKey};

#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub room_key: RoomKey,
    pub created_at: DateTime<Utc>,
}

/// Snapshot published to presentation code on every change.
#[derive(Debug, Clone, Default)]
pub struct SessionView {
    pub room: Option<RoomInfo>,
    pub local_participant_id: Option<ParticipantId>,
    pub is_connected: bool,
    pub is_loading: bool,
    pub participants: Vec<Participant>,
    pub remote_streams: Vec<RemoteStream>,
    pub has_local_stream: bool,
    pub is_muted: bool,
    pub is_video_off: bool,
}

impl SessionView {
    pub(crate) fn sync_router(&mut self, router: &MessageRouter) {
        self.local_participant_id = router.local_id().cloned();
        self.is_connected = router.is_connected();
        self.participants = router.directory().to_vec();
        self.remote_streams = router.peers().remote_streams();
    }

    pub fn participant(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.id == id)
    }

    pub fn remote_stream(&self, id: &ParticipantId) -> Option<&RemoteStream> {
        self.remote_streams.iter().find(|s| &s.participant_id == id)
    }
}
