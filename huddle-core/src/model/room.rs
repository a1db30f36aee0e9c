use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Shared secret that admits a participant into a room.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq)]
#[serde(transparent)]
pub struct RoomKey(pub String);

impl RoomKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RoomKey {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl fmt::Debug for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RoomKey(***)")
    }
}

/// Body of a successful `POST /api/rooms/create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomCredentials {
    pub room_id: RoomId,
    pub room_key: RoomKey,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub active_rooms: usize,
}
