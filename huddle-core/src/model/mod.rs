mod participant;
mod room;
mod signaling;

pub use participant::{ConnectionStatus, Participant, ParticipantId, StatusPatch};
pub use room::{HealthReport, RoomCredentials, RoomId, RoomKey};
pub use signaling::{
    ClientMessage, IceCandidate, IceServerConfig, SdpType, ServerMessage, SessionDescription,
};
