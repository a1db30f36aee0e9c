use crate::signaling::SignalingOutput;
use async_trait::async_trait;
use axum::extract::ws::Message;
use dashmap::DashMap;
use huddle_core::{ParticipantId, ServerMessage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, warn};

struct SignalingInner {
    peers: DashMap<ParticipantId, mpsc::UnboundedSender<Message>>,
}

/// Outbound socket registry shared by every room.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
}

impl Default for SignalingService {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalingService {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                peers: DashMap::new(),
            }),
        }
    }

    pub fn add_peer(&self, participant_id: ParticipantId, tx: mpsc::UnboundedSender<Message>) {
        self.inner.peers.insert(participant_id, tx);
    }

    pub fn remove_peer(&self, participant_id: &ParticipantId) {
        self.inner.peers.remove(participant_id);
    }

    pub fn peer_count(&self) -> usize {
        self.inner.peers.len()
    }

    pub fn send_signal(&self, participant_id: &ParticipantId, msg: &ServerMessage) {
        let Some(peer) = self.inner.peers.get(participant_id) else {
            warn!(
                "Attempted to send {} to disconnected participant {}",
                msg.kind(),
                participant_id
            );
            return;
        };

        match serde_json::to_string(msg) {
            Ok(json) => {
                if let Err(e) = peer.send(Message::Text(json.into())) {
                    error!("Failed to send WS message to {}: {:?}", participant_id, e);
                }
            }
            Err(e) => error!("Failed to serialize signal message: {}", e),
        }
    }
}

#[async_trait]
impl SignalingOutput for SignalingService {
    async fn deliver(&self, participant_id: ParticipantId, msg: ServerMessage) {
        self.send_signal(&participant_id, &msg);
    }
}
