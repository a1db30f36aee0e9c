use crate::room::{Room, RoomCommand};
use crate::signaling::SignalingOutput;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use huddle_core::{RoomCredentials, RoomId, RoomKey};
use rand::Rng;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

const ROOM_ID_LEN: usize = 6;
const ROOM_KEY_LEN: usize = 8;
const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

fn random_code(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

struct RoomHandle {
    key: RoomKey,
    sender: mpsc::Sender<RoomCommand>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomLookupError {
    NotFound,
    WrongKey,
}

impl IntoResponse for RoomLookupError {
    fn into_response(self) -> Response {
        match self {
            RoomLookupError::NotFound => (StatusCode::NOT_FOUND, "Room not found").into_response(),
            RoomLookupError::WrongKey => (StatusCode::UNAUTHORIZED, "Invalid room key").into_response(),
        }
    }
}

/// Live rooms by id. Each room runs as a task and is dropped when it empties.
#[derive(Clone)]
pub struct RoomManager {
    rooms: Arc<DashMap<RoomId, RoomHandle>>,
    signaling: Arc<dyn SignalingOutput>,
}

impl RoomManager {
    pub fn new(signaling: Arc<dyn SignalingOutput>) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            signaling,
        }
    }

    pub fn create_room(&self) -> RoomCredentials {
        let room_key = RoomKey(random_code(ROOM_KEY_LEN));
        let (tx, rx) = mpsc::channel(100);

        let room_id = loop {
            let candidate = RoomId(random_code(ROOM_ID_LEN));
            if let Entry::Vacant(slot) = self.rooms.entry(candidate.clone()) {
                slot.insert(RoomHandle {
                    key: room_key.clone(),
                    sender: tx.clone(),
                    created_at: Utc::now(),
                });
                break candidate;
            }
        };

        info!("Creating new room: {}", room_id);
        let room = Room::new(room_id.clone(), rx, self.signaling.clone());
        let rooms = self.rooms.clone();
        let id = room_id.clone();
        tokio::spawn(async move {
            room.run().await;
            rooms.remove_if(&id, |_, handle| handle.sender.same_channel(&tx));
            info!("Room {} removed", id);
        });

        RoomCredentials { room_id, room_key }
    }

    /// Check the key and hand back the room's command sender.
    pub fn verify(&self, room_id: &RoomId, room_key: &RoomKey) -> Result<mpsc::Sender<RoomCommand>, RoomLookupError> {
        let handle = self.rooms.get(room_id).ok_or(RoomLookupError::NotFound)?;
        if &handle.key != room_key {
            return Err(RoomLookupError::WrongKey);
        }
        Ok(handle.sender.clone())
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn created_at(&self, room_id: &RoomId) -> Option<DateTime<Utc>> {
        self.rooms.get(room_id).map(|handle| handle.created_at)
    }
}
