use crate::media::{LocalTrack, TrackKind};
use crate::peer::{LinkState, PeerEvent, PeerLink, PeerLinkFactory, RemoteTrack};
use crate::router::InboundSender;
use anyhow::{Result, bail};
use async_trait::async_trait;
use huddle_core::{IceCandidate, IceServerConfig, ParticipantId, SdpType, SessionDescription};
use std::sync::Arc;
use tracing::{debug, info};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::offer_answer_options::RTCOfferOptions;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::track::track_local::TrackLocal;

/// [`PeerLink`] over a webrtc-rs `RTCPeerConnection`.
pub struct RtcPeerLink {
    pub participant_id: ParticipantId,
    pub peer_connection: Arc<RTCPeerConnection>,
}

impl RtcPeerLink {
    pub async fn new(
        participant_id: ParticipantId,
        ice_servers: &[IceServerConfig],
        events: InboundSender,
    ) -> Result<Self> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);

        let state_events = events.clone();
        let pid_state = participant_id.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let events = state_events.clone();
                let pid = pid_state.clone();

                Box::pin(async move {
                    info!("Peer connection state for {}: {:?}", pid, s);
                    events.push_peer(&pid, PeerEvent::StateChanged(LinkState::from(s)));
                })
            },
        ));

        let ice_events = events.clone();
        let pid_ice = participant_id.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let events = ice_events.clone();
            let pid = pid_ice.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let candidate = IceCandidate {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_m_line_index: init.sdp_mline_index,
                    username_fragment: init.username_fragment,
                };
                events.push_peer(&pid, PeerEvent::CandidateGenerated(candidate));
            })
        }));

        let track_events = events;
        let pid_track = participant_id.clone();
        peer_connection.on_track(Box::new(move |track, _receiver, _transceiver| {
            let events = track_events.clone();
            let pid = pid_track.clone();

            Box::pin(async move {
                let kind = match track.kind() {
                    RTPCodecType::Audio => TrackKind::Audio,
                    RTPCodecType::Video => TrackKind::Video,
                    other => {
                        debug!("Ignoring {} track from {}", other, pid);
                        return;
                    }
                };
                debug!("Track {} ({:?}) from {}", track.id(), kind, pid);
                events.push_peer(&pid, PeerEvent::TrackAdded(RemoteTrack::from_rtc(track, kind)));
            })
        }));

        Ok(Self {
            participant_id,
            peer_connection,
        })
    }
}

#[async_trait]
impl PeerLink for RtcPeerLink {
    async fn add_track(&self, track: &LocalTrack) -> Result<()> {
        let sender = self
            .peer_connection
            .add_track(track.rtc() as Arc<dyn TrackLocal + Send + Sync>)
            .await?;

        // RTCP has to be read for interceptors to run.
        tokio::spawn(async move {
            let mut buf = vec![0u8; 1500];
            while sender.read(&mut buf).await.is_ok() {}
        });

        Ok(())
    }

    async fn create_offer(&self, ice_restart: bool) -> Result<SessionDescription> {
        let options = ice_restart.then(|| RTCOfferOptions {
            ice_restart: true,
            ..Default::default()
        });
        let offer = self.peer_connection.create_offer(options).await?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        let answer = self.peer_connection.create_answer(None).await?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()> {
        let desc = match description.sdp_type {
            SdpType::Offer => RTCSessionDescription::offer(description.sdp)?,
            SdpType::Answer => RTCSessionDescription::answer(description.sdp)?,
            SdpType::Pranswer => RTCSessionDescription::pranswer(description.sdp)?,
            SdpType::Rollback => bail!("rollback descriptions are not supported"),
        };
        self.peer_connection.set_remote_description(desc).await?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: candidate.username_fragment,
        };
        self.peer_connection.add_ice_candidate(init).await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.peer_connection.close().await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RtcPeerLinkFactory;

#[async_trait]
impl PeerLinkFactory for RtcPeerLinkFactory {
    async fn create(
        &self,
        participant_id: ParticipantId,
        ice_servers: &[IceServerConfig],
        events: InboundSender,
    ) -> Result<Box<dyn PeerLink>> {
        let link = RtcPeerLink::new(participant_id, ice_servers, events).await?;
        Ok(Box::new(link))
    }
}
