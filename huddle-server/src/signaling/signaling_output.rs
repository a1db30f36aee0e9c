use async_trait::async_trait;
use huddle_core::{ParticipantId, ServerMessage};

/// Implemented by whatever holds the participants' sockets, so a room can
/// reach them without knowing about WebSockets.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    async fn deliver(&self, participant_id: ParticipantId, msg: ServerMessage);
}
