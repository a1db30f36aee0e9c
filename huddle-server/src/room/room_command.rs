use huddle_core::{ClientMessage, Participant, ParticipantId};

/// Commands delivered to a room by the WebSocket handlers.
#[derive(Debug)]
pub enum RoomCommand {
    /// Socket registered; the participant enters the room.
    Join { participant: Participant },

    /// A frame received from a participant.
    Signal {
        from: ParticipantId,
        message: ClientMessage,
    },

    /// Socket closed or `leave` received.
    Disconnect { participant_id: ParticipantId },
}
