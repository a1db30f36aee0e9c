use crate::peer::NegotiationState;
use huddle_core::{ParticipantId, RoomId};
use std::time::Duration;
use thiserror::Error;

/// Local capture could not be started.
#[derive(Debug, Error)]
pub enum MediaAccessError {
    #[error("permission to capture media was denied")]
    PermissionDenied,

    #[error("no capture device available: {0}")]
    Unavailable(String),

    #[error("capture track was stopped")]
    TrackStopped,
}

/// Failure talking to the HTTP room service.
#[derive(Debug, Error)]
pub enum RoomServiceError {
    #[error("room service request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("room service answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("room {0} does not exist")]
    RoomNotFound(RoomId),

    #[error("wrong key for room {0}")]
    InvalidKey(RoomId),

    #[error("invalid room service url: {0}")]
    Url(#[from] url::ParseError),
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("signaling channel is not open")]
    NotOpen,

    #[error("signaling channel already connected")]
    AlreadyConnected,

    #[error("timed out after {0:?} opening signaling channel")]
    Timeout(Duration),

    #[error("websocket error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("failed to encode signaling message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("invalid signaling url: {0}")]
    Url(#[from] url::ParseError),
}

/// A negotiation step failed. The entry is kept so a later offer can repair it.
#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error("{step} failed for {participant_id}: {reason}")]
    Rtc {
        participant_id: ParticipantId,
        step: &'static str,
        reason: String,
    },

    #[error("{message} from {participant_id} arrived in state {state:?}")]
    OutOfSequence {
        participant_id: ParticipantId,
        message: &'static str,
        state: NegotiationState,
    },

    #[error("offer from {participant_id} collided with our own pending offer")]
    Glare { participant_id: ParticipantId },

    #[error("gave up on {participant_id} after {attempts} offers")]
    Exhausted {
        participant_id: ParticipantId,
        attempts: u32,
    },

    #[error(transparent)]
    Signaling(#[from] ChannelError),
}

impl NegotiationError {
    pub(crate) fn rtc(participant_id: &ParticipantId, step: &'static str, err: anyhow::Error) -> Self {
        Self::Rtc {
            participant_id: participant_id.clone(),
            step,
            reason: format!("{err:#}"),
        }
    }
}

/// Errors surfaced by [`crate::RoomSession`].
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    MediaAccess(#[from] MediaAccessError),

    #[error(transparent)]
    RoomService(#[from] RoomServiceError),

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error("a room session is already active")]
    AlreadyActive,
}
