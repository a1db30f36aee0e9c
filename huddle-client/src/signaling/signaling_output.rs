use crate::error::ChannelError;
use async_trait::async_trait;
use huddle_core::{ClientMessage, IceCandidate, ParticipantId, SessionDescription};

/// Outbound half of the signaling channel, as seen by the peer manager and media controller.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    /// Queue a frame for the relay. Fails with [`ChannelError::NotOpen`] instead of dropping it.
    async fn send(&self, message: ClientMessage) -> Result<(), ChannelError>;

    async fn send_offer(&self, to: ParticipantId, offer: SessionDescription) -> Result<(), ChannelError> {
        self.send(ClientMessage::Offer { offer, to }).await
    }

    async fn send_answer(&self, to: ParticipantId, answer: SessionDescription) -> Result<(), ChannelError> {
        self.send(ClientMessage::Answer { answer, to }).await
    }

    async fn send_ice(&self, to: ParticipantId, candidate: IceCandidate) -> Result<(), ChannelError> {
        self.send(ClientMessage::IceCandidate { candidate, to }).await
    }
}
