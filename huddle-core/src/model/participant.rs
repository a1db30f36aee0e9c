use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Server-assigned identity of one participant in a room.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ParticipantId(pub String);

impl ParticipantId {
    pub fn generate() -> Self {
        Self(format!("user_{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for ParticipantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Status of the direct link between the local user and a participant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Connecting,
    Connected,
    Disconnected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: ParticipantId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_muted: bool,
    #[serde(default)]
    pub is_video_off: bool,
    #[serde(default)]
    pub is_host: bool,
    #[serde(default)]
    pub connection_status: ConnectionStatus,
}

impl Participant {
    pub fn new(id: ParticipantId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            is_muted: false,
            is_video_off: false,
            is_host: false,
            connection_status: ConnectionStatus::Connecting,
        }
    }

    /// Merge a media status change announced by the participant.
    pub fn apply(&mut self, patch: &StatusPatch) {
        if let Some(muted) = patch.is_muted {
            self.is_muted = muted;
        }
        if let Some(video_off) = patch.is_video_off {
            self.is_video_off = video_off;
        }
    }
}

/// Partial media status, sent with `participant_update`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_muted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_video_off: Option<bool>,
}

impl StatusPatch {
    pub fn muted(is_muted: bool) -> Self {
        Self {
            is_muted: Some(is_muted),
            ..Default::default()
        }
    }

    pub fn video_off(is_video_off: bool) -> Self {
        Self {
            is_video_off: Some(is_video_off),
            ..Default::default()
        }
    }
}
