use crate::peer::PeerLink;
use huddle_core::{IceCandidate, ParticipantId};
use std::collections::VecDeque;
use tokio::task::JoinHandle;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    Stable,
    HaveLocalOffer,
    HaveRemoteOffer,
    Closed,
}

/// Which side sent the first offer. Only the initiator ever offers again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationRole {
    Initiator,
    Responder,
}

pub struct PeerConnectionEntry {
    pub participant_id: ParticipantId,
    pub(crate) link: Box<dyn PeerLink>,
    pub role: NegotiationRole,
    pub state: NegotiationState,
    pub remote_description_set: bool,
    pub(crate) pending_remote_candidates: VecDeque<IceCandidate>,
    pub offer_attempt: u32,
    /// Offers sent whose answer has not arrived yet.
    pub(crate) answers_owed: u32,
    timer: Option<JoinHandle<()>>,
}

impl PeerConnectionEntry {
    pub(crate) fn new(participant_id: ParticipantId, link: Box<dyn PeerLink>, role: NegotiationRole) -> Self {
        Self {
            participant_id,
            link,
            role,
            state: NegotiationState::Stable,
            remote_description_set: false,
            pending_remote_candidates: VecDeque::new(),
            offer_attempt: 0,
            answers_owed: 0,
            timer: None,
        }
    }

    pub fn pending_candidates(&self) -> usize {
        self.pending_remote_candidates.len()
    }

    pub(crate) fn arm_timer(&mut self, timer: JoinHandle<()>) {
        if let Some(old) = self.timer.replace(timer) {
            old.abort();
        }
    }

    pub(crate) fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    /// Apply buffered candidates in arrival order. Failures are logged and skipped.
    pub(crate) async fn drain_candidates(&mut self) {
        while let Some(candidate) = self.pending_remote_candidates.pop_front() {
            if let Err(e) = self.link.add_ice_candidate(candidate).await {
                warn!(
                    "Failed to apply buffered ICE candidate for {}: {:#}",
                    self.participant_id, e
                );
            }
        }
    }

    pub(crate) async fn close(&mut self) {
        self.cancel_timer();
        self.pending_remote_candidates.clear();
        if self.state == NegotiationState::Closed {
            return;
        }
        self.state = NegotiationState::Closed;
        if let Err(e) = self.link.close().await {
            warn!("Error closing connection to {}: {:#}", self.participant_id, e);
        }
    }
}

impl Drop for PeerConnectionEntry {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}
