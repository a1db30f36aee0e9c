use crate::room::RoomCommand;
use crate::signaling::SignalingOutput;
use huddle_core::{ClientMessage, ConnectionStatus, Participant, ParticipantId, RoomId, ServerMessage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// One room. Runs as its own task and handles commands strictly in order.
pub struct Room {
    room_id: RoomId,
    participants: Vec<Participant>,
    command_rx: mpsc::Receiver<RoomCommand>,
    signaling: Arc<dyn SignalingOutput>,
    had_participants: bool,
}

impl Room {
    pub fn new(
        room_id: RoomId,
        command_rx: mpsc::Receiver<RoomCommand>,
        signaling: Arc<dyn SignalingOutput>,
    ) -> Self {
        Self {
            room_id,
            participants: Vec::new(),
            command_rx,
            signaling,
            had_participants: false,
        }
    }

    /// Returns once the last participant has left or every sender is gone.
    pub async fn run(mut self) {
        info!("Room {} event loop started", self.room_id);

        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd).await;

            if self.had_participants && self.participants.is_empty() {
                info!("Room {} is empty. Shutting down room.", self.room_id);
                break;
            }
        }

        info!("Room {} event loop finished", self.room_id);
    }

    async fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join { participant } => self.join(participant).await,

            RoomCommand::Signal { from, message } => {
                if !self.contains(&from) {
                    warn!("Signal from {} who is not in room {}", from, self.room_id);
                    return;
                }
                self.relay(from, message).await;
            }

            RoomCommand::Disconnect { participant_id } => self.leave(&participant_id).await,
        }
    }

    async fn join(&mut self, mut participant: Participant) {
        if self.contains(&participant.id) {
            warn!("Participant {} joined room {} twice", participant.id, self.room_id);
            return;
        }

        participant.is_host = self.participants.is_empty();
        participant.connection_status = ConnectionStatus::Connected;
        info!(
            "Participant {} ({}) joined room {}",
            participant.id, participant.name, self.room_id
        );

        self.participants.push(participant.clone());
        self.had_participants = true;

        let snapshot = ServerMessage::RoomJoined {
            participants: self.participants.clone(),
            participant_id: Some(participant.id.clone()),
        };
        self.signaling.deliver(participant.id.clone(), snapshot).await;

        let id = participant.id.clone();
        self.broadcast(ServerMessage::ParticipantJoined { participant }, Some(&id))
            .await;
    }

    async fn relay(&mut self, from: ParticipantId, message: ClientMessage) {
        match message {
            ClientMessage::Offer { offer, to } => {
                self.forward(to, ServerMessage::Offer { offer, from }).await;
            }
            ClientMessage::Answer { answer, to } => {
                self.forward(to, ServerMessage::Answer { answer, from }).await;
            }
            ClientMessage::IceCandidate { candidate, to } => {
                self.forward(to, ServerMessage::IceCandidate { candidate, from })
                    .await;
            }
            ClientMessage::ParticipantUpdate { data } => {
                let Some(participant) = self.participants.iter_mut().find(|p| p.id == from) else {
                    return;
                };
                participant.apply(&data);
                let participant = participant.clone();
                self.broadcast(ServerMessage::ParticipantUpdated { participant }, Some(&from))
                    .await;
            }
            ClientMessage::Leave => self.leave(&from).await,
        }
    }

    async fn forward(&self, to: ParticipantId, msg: ServerMessage) {
        if !self.contains(&to) {
            warn!("Dropping {} for {} who is not in room {}", msg.kind(), to, self.room_id);
            return;
        }
        debug!("Relaying {} to {}", msg.kind(), to);
        self.signaling.deliver(to, msg).await;
    }

    async fn leave(&mut self, participant_id: &ParticipantId) {
        let Some(index) = self.participants.iter().position(|p| &p.id == participant_id) else {
            return;
        };
        self.participants.remove(index);
        info!("Participant {} left room {}", participant_id, self.room_id);

        self.broadcast(
            ServerMessage::ParticipantLeft {
                participant_id: participant_id.clone(),
            },
            None,
        )
        .await;
    }

    async fn broadcast(&self, msg: ServerMessage, exclude: Option<&ParticipantId>) {
        for participant in &self.participants {
            if Some(&participant.id) == exclude {
                continue;
            }
            self.signaling
                .deliver(participant.id.clone(), msg.clone())
                .await;
        }
    }

    fn contains(&self, id: &ParticipantId) -> bool {
        self.participants.iter().any(|p| &p.id == id)
    }
}
