use crate::media::LocalTrack;
use crate::router::InboundSender;
use anyhow::Result;
use async_trait::async_trait;
use huddle_core::{IceCandidate, IceServerConfig, ParticipantId, SessionDescription};

/// One negotiated connection to one participant.
///
/// `create_offer` and `create_answer` also install the result as the local description.
#[async_trait]
pub trait PeerLink: Send + Sync {
    async fn add_track(&self, track: &LocalTrack) -> Result<()>;

    async fn create_offer(&self, ice_restart: bool) -> Result<SessionDescription>;

    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

/// Builds links that report their events through `events`.
#[async_trait]
pub trait PeerLinkFactory: Send + Sync {
    async fn create(
        &self,
        participant_id: ParticipantId,
        ice_servers: &[IceServerConfig],
        events: InboundSender,
    ) -> Result<Box<dyn PeerLink>>;
}
