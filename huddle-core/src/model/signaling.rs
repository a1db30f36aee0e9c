use crate::model::participant::{Participant, ParticipantId, StatusPatch};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub credential: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpType {
    Offer,
    Pranswer,
    Answer,
    Rollback,
}

/// Session description in the shape browsers put on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub sdp_type: SdpType,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: SdpType::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: SdpType::Answer,
            sdp: sdp.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(default)]
    pub sdp_mid: Option<String>,
    #[serde(default, rename = "sdpMLineIndex")]
    pub sdp_m_line_index: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username_fragment: Option<String>,
}

impl IceCandidate {
    pub fn new(candidate: impl Into<String>) -> Self {
        Self {
            candidate: candidate.into(),
            sdp_mid: None,
            sdp_m_line_index: None,
            username_fragment: None,
        }
    }
}

/// Frames the relay sends to a participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Snapshot sent once to the participant that just connected.
    RoomJoined {
        participants: Vec<Participant>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        participant_id: Option<ParticipantId>,
    },
    ParticipantJoined {
        participant: Participant,
    },
    ParticipantLeft {
        participant_id: ParticipantId,
    },
    ParticipantUpdated {
        participant: Participant,
    },
    Offer {
        offer: SessionDescription,
        from: ParticipantId,
    },
    Answer {
        answer: SessionDescription,
        from: ParticipantId,
    },
    IceCandidate {
        candidate: IceCandidate,
        from: ParticipantId,
    },
    #[serde(other)]
    Unknown,
}

impl ServerMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::RoomJoined { .. } => "room_joined",
            ServerMessage::ParticipantJoined { .. } => "participant_joined",
            ServerMessage::ParticipantLeft { .. } => "participant_left",
            ServerMessage::ParticipantUpdated { .. } => "participant_updated",
            ServerMessage::Offer { .. } => "offer",
            ServerMessage::Answer { .. } => "answer",
            ServerMessage::IceCandidate { .. } => "ice_candidate",
            ServerMessage::Unknown => "unknown",
        }
    }
}

/// Frames a participant sends to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Offer {
        offer: SessionDescription,
        to: ParticipantId,
    },
    Answer {
        answer: SessionDescription,
        to: ParticipantId,
    },
    IceCandidate {
        candidate: IceCandidate,
        to: ParticipantId,
    },
    ParticipantUpdate {
        data: StatusPatch,
    },
    Leave,
}

impl ClientMessage {
    /// Participant a negotiation frame is addressed to.
    pub fn target(&self) -> Option<&ParticipantId> {
        match self {
            ClientMessage::Offer { to, .. }
            | ClientMessage::Answer { to, .. }
            | ClientMessage::IceCandidate { to, .. } => Some(to),
            ClientMessage::ParticipantUpdate { .. } | ClientMessage::Leave => None,
        }
    }
}
