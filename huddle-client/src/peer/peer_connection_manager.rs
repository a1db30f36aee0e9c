use crate::error::NegotiationError;
use crate::media::LocalStream;
use crate::peer::{
    LinkState, NegotiationRole, NegotiationState, PeerConnectionEntry, PeerEvent, PeerLinkFactory,
    RemoteStream, RemoteTrack,
};
use crate::router::{Dispatch, InboundSender};
use crate::signaling::SignalingOutput;
use huddle_core::{IceCandidate, IceServerConfig, ParticipantId, SessionDescription};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Candidates held per participant before their connection exists.
pub const MAX_EARLY_CANDIDATES: usize = 128;

#[derive(Debug, Clone, Copy)]
pub struct NegotiationPolicy {
    pub timeout: Duration,
    pub max_attempts: u32,
}

impl Default for NegotiationPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            max_attempts: 3,
        }
    }
}

/// Owns one connection per remote participant and the streams they deliver.
pub struct PeerConnectionManager {
    factory: Arc<dyn PeerLinkFactory>,
    signaling: Arc<dyn SignalingOutput>,
    inbound: InboundSender,
    ice_servers: Vec<IceServerConfig>,
    local_stream: Option<LocalStream>,
    policy: NegotiationPolicy,
    entries: HashMap<ParticipantId, PeerConnectionEntry>,
    early_candidates: HashMap<ParticipantId, Vec<IceCandidate>>,
    remote_streams: HashMap<ParticipantId, RemoteStream>,
    closed: bool,
}

impl PeerConnectionManager {
    pub fn new(
        factory: Arc<dyn PeerLinkFactory>,
        signaling: Arc<dyn SignalingOutput>,
        inbound: InboundSender,
        ice_servers: Vec<IceServerConfig>,
        local_stream: Option<LocalStream>,
        policy: NegotiationPolicy,
    ) -> Self {
        Self {
            factory,
            signaling,
            inbound,
            ice_servers,
            local_stream,
            policy,
            entries: HashMap::new(),
            early_candidates: HashMap::new(),
            remote_streams: HashMap::new(),
            closed: false,
        }
    }

    /// Open a connection toward a newcomer and send it our offer.
    pub async fn initiate(&mut self, participant_id: &ParticipantId) -> Result<Dispatch, NegotiationError> {
        if self.closed {
            return Ok(Dispatch::Stale);
        }
        if self.entries.contains_key(participant_id) {
            debug!("Connection to {} already exists", participant_id);
            return Ok(Dispatch::Ignored);
        }

        self.create_entry(participant_id, NegotiationRole::Initiator)
            .await?;
        self.send_offer(participant_id, false).await?;
        Ok(Dispatch::Applied)
    }

    pub async fn handle_offer(
        &mut self,
        participant_id: &ParticipantId,
        offer: SessionDescription,
    ) -> Result<Dispatch, NegotiationError> {
        if self.closed {
            return Ok(Dispatch::Stale);
        }
        if !self.entries.contains_key(participant_id) {
            self.create_entry(participant_id, NegotiationRole::Responder)
                .await?;
        }
        let Some(entry) = self.entries.get_mut(participant_id) else {
            return Ok(Dispatch::Stale);
        };

        match entry.state {
            NegotiationState::HaveLocalOffer => {
                return Err(NegotiationError::Glare {
                    participant_id: participant_id.clone(),
                });
            }
            NegotiationState::Closed => return Ok(Dispatch::Stale),
            NegotiationState::Stable | NegotiationState::HaveRemoteOffer => {}
        }

        entry
            .link
            .set_remote_description(offer)
            .await
            .map_err(|e| NegotiationError::rtc(participant_id, "apply offer", e))?;
        entry.state = NegotiationState::HaveRemoteOffer;
        entry.remote_description_set = true;
        entry.drain_candidates().await;

        let answer = entry
            .link
            .create_answer()
            .await
            .map_err(|e| NegotiationError::rtc(participant_id, "create answer", e))?;
        entry.state = NegotiationState::Stable;

        self.signaling
            .send_answer(participant_id.clone(), answer)
            .await?;
        debug!("Answered offer from {}", participant_id);
        Ok(Dispatch::Applied)
    }

    pub async fn handle_answer(
        &mut self,
        participant_id: &ParticipantId,
        answer: SessionDescription,
    ) -> Result<Dispatch, NegotiationError> {
        let Some(entry) = self.entries.get_mut(participant_id) else {
            warn!("Answer from {} without a pending offer", participant_id);
            return Ok(Dispatch::Stale);
        };

        if entry.state != NegotiationState::HaveLocalOffer {
            // A re-sent offer crossed the answer to the one before it, and that
            // older answer has already been applied. Offer again so both sides
            // end up on the same ICE credentials.
            if entry.state == NegotiationState::Stable && entry.answers_owed > 0 {
                entry.answers_owed -= 1;
                warn!("Answer from {} crossed a re-sent offer, offering again", participant_id);
                self.send_offer(participant_id, true).await?;
                return Ok(Dispatch::Applied);
            }
            return Err(NegotiationError::OutOfSequence {
                participant_id: participant_id.clone(),
                message: "answer",
                state: entry.state,
            });
        }

        entry.answers_owed = entry.answers_owed.saturating_sub(1);
        entry
            .link
            .set_remote_description(answer)
            .await
            .map_err(|e| NegotiationError::rtc(participant_id, "apply answer", e))?;
        entry.cancel_timer();
        entry.state = NegotiationState::Stable;
        entry.remote_description_set = true;
        entry.drain_candidates().await;

        debug!("Applied answer from {}", participant_id);
        Ok(Dispatch::Applied)
    }

    /// Candidates are applied once a remote description exists and held until then.
    pub async fn handle_ice_candidate(
        &mut self,
        participant_id: &ParticipantId,
        candidate: IceCandidate,
    ) -> Result<Dispatch, NegotiationError> {
        if self.closed {
            return Ok(Dispatch::Stale);
        }

        let Some(entry) = self.entries.get_mut(participant_id) else {
            let early = self
                .early_candidates
                .entry(participant_id.clone())
                .or_default();
            if early.len() >= MAX_EARLY_CANDIDATES {
                warn!("Dropping ICE candidate from {}: too many early candidates", participant_id);
                return Ok(Dispatch::Ignored);
            }
            early.push(candidate);
            return Ok(Dispatch::Buffered);
        };

        if !entry.remote_description_set {
            entry.pending_remote_candidates.push_back(candidate);
            return Ok(Dispatch::Buffered);
        }

        entry
            .link
            .add_ice_candidate(candidate)
            .await
            .map_err(|e| NegotiationError::rtc(participant_id, "add ICE candidate", e))?;
        Ok(Dispatch::Applied)
    }

    pub fn on_remote_track(&mut self, participant_id: &ParticipantId, track: RemoteTrack) -> Dispatch {
        if !self.entries.contains_key(participant_id) {
            return Dispatch::Stale;
        }

        info!("Remote {:?} track {} from {}", track.kind, track.id, participant_id);
        self.remote_streams
            .entry(participant_id.clone())
            .or_insert_with(|| RemoteStream::new(participant_id.clone()))
            .add_track(track);
        Dispatch::Applied
    }

    pub async fn on_local_candidate(
        &mut self,
        participant_id: &ParticipantId,
        candidate: IceCandidate,
    ) -> Result<Dispatch, NegotiationError> {
        if !self.entries.contains_key(participant_id) {
            return Ok(Dispatch::Stale);
        }
        self.signaling
            .send_ice(participant_id.clone(), candidate)
            .await?;
        Ok(Dispatch::Applied)
    }

    /// On `Failed` the initiating side restarts ICE on the existing connection.
    pub async fn on_link_state(
        &mut self,
        participant_id: &ParticipantId,
        state: LinkState,
    ) -> Result<Dispatch, NegotiationError> {
        let Some(entry) = self.entries.get_mut(participant_id) else {
            return Ok(Dispatch::Stale);
        };

        if state == LinkState::Failed && entry.role == NegotiationRole::Initiator {
            info!("Connection to {} failed, restarting ICE", participant_id);
            entry.offer_attempt = 0;
            self.send_offer(participant_id, true).await?;
        }
        Ok(Dispatch::Applied)
    }

    pub async fn on_negotiation_timeout(
        &mut self,
        participant_id: &ParticipantId,
        attempt: u32,
    ) -> Result<Dispatch, NegotiationError> {
        let Some(entry) = self.entries.get(participant_id) else {
            return Ok(Dispatch::Stale);
        };
        if entry.state != NegotiationState::HaveLocalOffer || entry.offer_attempt != attempt {
            return Ok(Dispatch::Stale);
        }
        if attempt >= self.policy.max_attempts {
            return Err(NegotiationError::Exhausted {
                participant_id: participant_id.clone(),
                attempts: attempt,
            });
        }

        warn!("Offer {} to {} unanswered, re-sending", attempt, participant_id);
        self.send_offer(participant_id, true).await?;
        Ok(Dispatch::Applied)
    }

    /// Close and forget everything about one participant.
    pub async fn remove(&mut self, participant_id: &ParticipantId) -> bool {
        self.early_candidates.remove(participant_id);
        self.remote_streams.remove(participant_id);

        let Some(mut entry) = self.entries.remove(participant_id) else {
            return false;
        };
        entry.close().await;
        info!("Closed connection to {}", participant_id);
        true
    }

    /// Tear down every connection. Later calls into the manager are stale.
    pub async fn close_all(&mut self) {
        self.closed = true;
        self.early_candidates.clear();
        self.remote_streams.clear();

        for (_, mut entry) in self.entries.drain() {
            entry.close().await;
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, participant_id: &ParticipantId) -> bool {
        self.entries.contains_key(participant_id)
    }

    pub fn entry(&self, participant_id: &ParticipantId) -> Option<&PeerConnectionEntry> {
        self.entries.get(participant_id)
    }

    pub fn negotiation_state(&self, participant_id: &ParticipantId) -> Option<NegotiationState> {
        self.entries.get(participant_id).map(|e| e.state)
    }

    pub fn early_candidate_count(&self, participant_id: &ParticipantId) -> usize {
        self.early_candidates
            .get(participant_id)
            .map_or(0, Vec::len)
    }

    pub fn remote_stream(&self, participant_id: &ParticipantId) -> Option<&RemoteStream> {
        self.remote_streams.get(participant_id)
    }

    pub fn remote_streams(&self) -> Vec<RemoteStream> {
        let mut streams: Vec<_> = self.remote_streams.values().cloned().collect();
        streams.sort_by(|a, b| a.participant_id.cmp(&b.participant_id));
        streams
    }

    async fn create_entry(
        &mut self,
        participant_id: &ParticipantId,
        role: NegotiationRole,
    ) -> Result<(), NegotiationError> {
        let link = self
            .factory
            .create(participant_id.clone(), &self.ice_servers, self.inbound.clone())
            .await
            .map_err(|e| NegotiationError::rtc(participant_id, "create connection", e))?;

        if let Some(stream) = &self.local_stream {
            for track in stream.tracks() {
                if let Err(e) = link.add_track(track).await {
                    let _ = link.close().await;
                    return Err(NegotiationError::rtc(participant_id, "attach local track", e));
                }
            }
        }

        let mut entry = PeerConnectionEntry::new(participant_id.clone(), link, role);
        if let Some(early) = self.early_candidates.remove(participant_id) {
            entry.pending_remote_candidates.extend(early);
        }

        info!("Created {:?} connection to {}", role, participant_id);
        self.entries.insert(participant_id.clone(), entry);
        Ok(())
    }

    async fn send_offer(&mut self, participant_id: &ParticipantId, ice_restart: bool) -> Result<(), NegotiationError> {
        let Some(entry) = self.entries.get_mut(participant_id) else {
            return Ok(());
        };

        let offer = entry
            .link
            .create_offer(ice_restart)
            .await
            .map_err(|e| NegotiationError::rtc(participant_id, "create offer", e))?;
        entry.state = NegotiationState::HaveLocalOffer;
        entry.offer_attempt += 1;
        entry.answers_owed += 1;

        let attempt = entry.offer_attempt;
        let inbound = self.inbound.clone();
        let timeout = self.policy.timeout;
        let pid = participant_id.clone();
        entry.arm_timer(tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            inbound.push_peer(&pid, PeerEvent::NegotiationTimeout { attempt });
        }));

        self.signaling
            .send_offer(participant_id.clone(), offer)
            .await?;
        debug!("Sent offer {} to {}", attempt, participant_id);
        Ok(())
    }
}
