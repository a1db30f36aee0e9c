use crate::peer::PeerEvent;
use crate::signaling::ChannelEvent;
use huddle_core::ParticipantId;
use tokio::sync::mpsc;

/// Anything the router reacts to.
#[derive(Debug, Clone)]
pub enum Inbound {
    Channel(ChannelEvent),
    Peer {
        participant_id: ParticipantId,
        event: PeerEvent,
    },
}

/// An [`Inbound`] item stamped with the session that produced it.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub generation: u64,
    pub inbound: Inbound,
}

/// Producer side of the session's single ordered queue.
#[derive(Debug, Clone)]
pub struct InboundSender {
    generation: u64,
    tx: mpsc::UnboundedSender<Envelope>,
}

impl InboundSender {
    pub fn new(generation: u64) -> (Self, mpsc::UnboundedReceiver<Envelope>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { generation, tx }, rx)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns false once the session that owns the queue is gone.
    pub fn push(&self, inbound: Inbound) -> bool {
        self.tx
            .send(Envelope {
                generation: self.generation,
                inbound,
            })
            .is_ok()
    }

    pub fn push_channel(&self, event: ChannelEvent) -> bool {
        self.push(Inbound::Channel(event))
    }

    pub fn push_peer(&self, participant_id: &ParticipantId, event: PeerEvent) -> bool {
        self.push(Inbound::Peer {
            participant_id: participant_id.clone(),
            event,
        })
    }
}
