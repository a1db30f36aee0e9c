use crate::error::NegotiationError;
use crate::peer::{PeerConnectionManager, PeerEvent};
use crate::router::{Envelope, Inbound, ParticipantDirectory};
use crate::signaling::{ChannelEvent, ChannelStatus};
use huddle_core::{ConnectionStatus, ParticipantId, ServerMessage};
use tracing::{debug, error, info, warn};

/// What happened to one routed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Applied,
    /// Held until the connection can take it.
    Buffered,
    /// From an old session, a closed session or a participant we do not know.
    Stale,
    Ignored,
    /// A negotiation step failed. The entry is kept.
    Failed,
}

/// Single consumer of the session queue. Items are handled one at a time,
/// in arrival order.
pub struct MessageRouter {
    generation: u64,
    local_id: Option<ParticipantId>,
    directory: ParticipantDirectory,
    peers: PeerConnectionManager,
    connected: bool,
}

impl MessageRouter {
    pub fn new(generation: u64, peers: PeerConnectionManager) -> Self {
        Self {
            generation,
            local_id: None,
            directory: ParticipantDirectory::default(),
            peers,
            connected: false,
        }
    }

    pub async fn dispatch(&mut self, envelope: Envelope) -> Dispatch {
        if envelope.generation != self.generation || self.peers.is_closed() {
            debug!(
                "Dropping item from session {} (current {})",
                envelope.generation, self.generation
            );
            return Dispatch::Stale;
        }

        match envelope.inbound {
            Inbound::Channel(ChannelEvent::Status(status)) => {
                self.connected = status == ChannelStatus::Open;
                if let Some(local_id) = &self.local_id {
                    let status = if self.connected {
                        ConnectionStatus::Connected
                    } else {
                        ConnectionStatus::Disconnected
                    };
                    self.directory.set_status(local_id, status);
                }
                Dispatch::Applied
            }
            Inbound::Channel(ChannelEvent::Message(msg)) => self.route_message(msg).await,
            Inbound::Peer {
                participant_id,
                event,
            } => self.route_peer_event(&participant_id, event).await,
        }
    }

    async fn route_message(&mut self, msg: ServerMessage) -> Dispatch {
        let kind = msg.kind();
        debug!("<- {}", kind);

        let result = match msg {
            ServerMessage::RoomJoined {
                participants,
                participant_id,
            } => {
                info!("Joined room with {} participants", participants.len());
                // Remote status only follows our own link to them.
                let participants = participants
                    .into_iter()
                    .map(|mut participant| {
                        if participant_id.as_ref() != Some(&participant.id) {
                            participant.connection_status = ConnectionStatus::Connecting;
                        }
                        participant
                    })
                    .collect();
                self.directory.replace_all(participants);
                if let Some(local_id) = participant_id {
                    self.directory
                        .set_status(&local_id, ConnectionStatus::Connected);
                    self.local_id = Some(local_id);
                }
                Ok(Dispatch::Applied)
            }

            ServerMessage::ParticipantJoined { mut participant } => {
                if self.is_local(&participant.id) {
                    return Dispatch::Ignored;
                }
                info!("Participant {} ({}) joined", participant.id, participant.name);
                participant.connection_status = ConnectionStatus::Connecting;
                let id = participant.id.clone();
                self.directory.upsert(participant);
                self.peers.initiate(&id).await
            }

            ServerMessage::ParticipantLeft { participant_id } => {
                let known = self.directory.remove(&participant_id).is_some();
                let had_connection = self.peers.remove(&participant_id).await;
                info!("Participant {} left", participant_id);
                Ok(if known || had_connection {
                    Dispatch::Applied
                } else {
                    Dispatch::Stale
                })
            }

            ServerMessage::ParticipantUpdated { participant } => {
                if self.directory.contains(&participant.id) {
                    self.directory.upsert(participant);
                    Ok(Dispatch::Applied)
                } else {
                    Ok(Dispatch::Stale)
                }
            }

            ServerMessage::Offer { offer, from } => {
                if !self.is_known(&from) {
                    Ok(Dispatch::Stale)
                } else {
                    self.peers.handle_offer(&from, offer).await
                }
            }

            ServerMessage::Answer { answer, from } => self.peers.handle_answer(&from, answer).await,

            ServerMessage::IceCandidate { candidate, from } => {
                if !self.is_known(&from) {
                    Ok(Dispatch::Stale)
                } else {
                    self.peers.handle_ice_candidate(&from, candidate).await
                }
            }

            ServerMessage::Unknown => {
                warn!("Ignoring signaling message of unknown type");
                Ok(Dispatch::Ignored)
            }
        };

        let outcome = self.settle(result);
        if outcome == Dispatch::Stale {
            warn!("Ignoring stale {} message", kind);
        }
        outcome
    }

    async fn route_peer_event(&mut self, participant_id: &ParticipantId, event: PeerEvent) -> Dispatch {
        let result = match event {
            PeerEvent::TrackAdded(track) => Ok(self.peers.on_remote_track(participant_id, track)),

            PeerEvent::CandidateGenerated(candidate) => {
                self.peers
                    .on_local_candidate(participant_id, candidate)
                    .await
            }

            PeerEvent::StateChanged(state) => {
                if self.peers.contains(participant_id) {
                    self.directory
                        .set_status(participant_id, state.connection_status());
                }
                self.peers.on_link_state(participant_id, state).await
            }

            PeerEvent::NegotiationTimeout { attempt } => {
                self.peers
                    .on_negotiation_timeout(participant_id, attempt)
                    .await
            }
        };

        self.settle(result)
    }

    fn settle(&mut self, result: Result<Dispatch, NegotiationError>) -> Dispatch {
        match result {
            Ok(outcome) => outcome,
            Err(NegotiationError::Exhausted {
                participant_id,
                attempts,
            }) => {
                warn!(
                    "No answer from {} after {} offers, marking disconnected",
                    participant_id, attempts
                );
                self.directory
                    .set_status(&participant_id, ConnectionStatus::Disconnected);
                Dispatch::Failed
            }
            Err(e) => {
                error!("Negotiation error: {}", e);
                Dispatch::Failed
            }
        }
    }

    fn is_local(&self, id: &ParticipantId) -> bool {
        self.local_id.as_ref() == Some(id)
    }

    fn is_known(&self, id: &ParticipantId) -> bool {
        !self.is_local(id) && (self.directory.contains(id) || self.peers.contains(id))
    }

    /// Close every connection and forget the room. Later items are stale.
    pub async fn close(&mut self) {
        self.peers.close_all().await;
        self.directory.clear();
        self.connected = false;
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn local_id(&self) -> Option<&ParticipantId> {
        self.local_id.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn directory(&self) -> &ParticipantDirectory {
        &self.directory
    }

    pub fn peers(&self) -> &PeerConnectionManager {
        &self.peers
    }

    pub fn peers_mut(&mut self) -> &mut PeerConnectionManager {
        &mut self.peers
    }
}
