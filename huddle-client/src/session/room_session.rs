use crate::config::ClientConfig;
use crate::error::{ChannelError, SessionError};
use crate::media::{LocalStream, MediaController, MediaDevices, SampleDevices};
use crate::peer::{NegotiationPolicy, PeerConnectionManager, PeerLinkFactory, RtcPeerLinkFactory};
use crate::rooms_api::RoomsApi;
use crate::router::{Envelope, InboundSender, MessageRouter};
use crate::session::{RoomInfo, SessionView};
use crate::signaling::{SignalingChannel, SignalingOutput};
use chrono::Utc;
use huddle_core::{ClientMessage, RoomId, RoomKey};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

struct LiveSession {
    channel: Arc<SignalingChannel>,
    router: Arc<Mutex<MessageRouter>>,
    pump: JoinHandle<()>,
}

struct SessionState {
    media: MediaController,
    live: Option<LiveSession>,
}

/// Entry point for presentation code: create, join and leave a room, toggle
/// local media, and watch [`SessionView`] for everything else.
pub struct RoomSession {
    config: ClientConfig,
    api: RoomsApi,
    links: Arc<dyn PeerLinkFactory>,
    state: Mutex<SessionState>,
    view: Arc<watch::Sender<SessionView>>,
    generation: AtomicU64,
}

impl RoomSession {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_parts(config, Arc::new(SampleDevices), Arc::new(RtcPeerLinkFactory))
    }

    pub fn with_parts(
        config: ClientConfig,
        devices: Arc<dyn MediaDevices>,
        links: Arc<dyn PeerLinkFactory>,
    ) -> Self {
        let (view, _) = watch::channel(SessionView::default());
        let media = MediaController::new(devices, config.media.clone());

        Self {
            api: RoomsApi::new(config.backend_url.clone()),
            config,
            links,
            state: Mutex::new(SessionState { media, live: None }),
            view: Arc::new(view),
            generation: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view.subscribe()
    }

    pub fn view(&self) -> SessionView {
        self.view.borrow().clone()
    }

    pub fn rooms(&self) -> &RoomsApi {
        &self.api
    }

    pub async fn is_active(&self) -> bool {
        self.state.lock().await.live.is_some()
    }

    pub async fn local_stream(&self) -> Option<LocalStream> {
        self.state.lock().await.media.stream().cloned()
    }

    /// Ask the room service for a new room, then join it.
    pub async fn create_room(&self) -> Result<RoomInfo, SessionError> {
        if self.is_active().await {
            return Err(SessionError::AlreadyActive);
        }

        self.view.send_modify(|v| v.is_loading = true);
        let credentials = match self.api.create_room().await {
            Ok(credentials) => credentials,
            Err(e) => {
                self.view.send_modify(|v| v.is_loading = false);
                return Err(e.into());
            }
        };

        info!("Created room {}", credentials.room_id);
        self.join_room(credentials.room_id, credentials.room_key)
            .await
    }

    /// Acquire media and open the channel. Opening the channel is the existence check.
    pub async fn join_room(&self, room_id: RoomId, room_key: RoomKey) -> Result<RoomInfo, SessionError> {
        let mut state = self.state.lock().await;
        if state.live.is_some() {
            // A create_room racing this session may have raised the flag.
            self.view.send_modify(|v| v.is_loading = false);
            return Err(SessionError::AlreadyActive);
        }

        self.view.send_modify(|v| v.is_loading = true);

        match self.open(&mut state, room_id, room_key).await {
            Ok(info) => Ok(info),
            Err(e) => {
                info!("Join failed: {}", e);
                state.media.release();
                self.view.send_replace(SessionView::default());
                Err(e)
            }
        }
    }

    async fn open(
        &self,
        state: &mut SessionState,
        room_id: RoomId,
        room_key: RoomKey,
    ) -> Result<RoomInfo, SessionError> {
        let url = self
            .config
            .signaling_url(&room_id, &room_key)
            .map_err(ChannelError::from)?;

        let stream = state.media.acquire().await?;

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let (inbound, rx) = InboundSender::new(generation);

        let channel = Arc::new(SignalingChannel::new(self.config.connect_timeout));
        let sink = inbound.clone();
        channel.on_message(move |event| {
            sink.push_channel(event);
        });
        channel.connect(&url).await?;

        let signaling: Arc<dyn SignalingOutput> = channel.clone();
        let peers = PeerConnectionManager::new(
            Arc::clone(&self.links),
            Arc::clone(&signaling),
            inbound,
            self.config.ice_servers.clone(),
            Some(stream),
            NegotiationPolicy {
                timeout: self.config.negotiation_timeout,
                max_attempts: self.config.max_negotiation_attempts,
            },
        );
        let router = Arc::new(Mutex::new(MessageRouter::new(generation, peers)));
        state.media.bind_signaling(signaling);

        let pump = tokio::spawn(pump(rx, Arc::clone(&router), Arc::clone(&self.view)));

        let info = RoomInfo {
            room_id,
            room_key,
            created_at: Utc::now(),
        };
        info!("Joined room {} (session {})", info.room_id, generation);

        state.live = Some(LiveSession {
            channel,
            router,
            pump,
        });

        let (is_muted, is_video_off) = (state.media.is_muted(), state.media.is_video_off());
        self.view.send_modify(|v| {
            v.room = Some(info.clone());
            v.is_loading = false;
            v.has_local_stream = true;
            v.is_muted = is_muted;
            v.is_video_off = is_video_off;
        });

        Ok(info)
    }

    /// Close the channel, every connection and the local stream. Always safe.
    pub async fn leave_room(&self) {
        let mut state = self.state.lock().await;

        if let Some(live) = state.live.take() {
            info!("Leaving room");
            if let Err(e) = live.channel.send(ClientMessage::Leave).await {
                debug!("Leave notification not sent: {}", e);
            }
            live.channel.close().await;
            live.pump.abort();
            live.router.lock().await.close().await;
        }

        state.media.release();
        self.view.send_replace(SessionView::default());
    }

    /// Returns false when there is no local stream.
    pub async fn set_audio_enabled(&self, enabled: bool) -> bool {
        let mut state = self.state.lock().await;
        let applied = state.media.set_audio_enabled(enabled).await;
        self.publish_media(&state.media);
        applied
    }

    pub async fn set_video_enabled(&self, enabled: bool) -> bool {
        let mut state = self.state.lock().await;
        let applied = state.media.set_video_enabled(enabled).await;
        self.publish_media(&state.media);
        applied
    }

    /// Returns the new `is_muted`.
    pub async fn toggle_audio(&self) -> bool {
        let mut state = self.state.lock().await;
        let is_muted = state.media.toggle_audio().await;
        self.publish_media(&state.media);
        is_muted
    }

    /// Returns the new `is_video_off`.
    pub async fn toggle_video(&self) -> bool {
        let mut state = self.state.lock().await;
        let is_video_off = state.media.toggle_video().await;
        self.publish_media(&state.media);
        is_video_off
    }

    fn publish_media(&self, media: &MediaController) {
        let is_muted = media.is_muted();
        let is_video_off = media.is_video_off();
        self.view.send_modify(|v| {
            v.is_muted = is_muted;
            v.is_video_off = is_video_off;
        });
    }
}

impl Drop for RoomSession {
    fn drop(&mut self) {
        if let Some(live) = self.state.get_mut().live.take() {
            live.pump.abort();
        }
    }
}

async fn pump(
    mut rx: mpsc::UnboundedReceiver<Envelope>,
    router: Arc<Mutex<MessageRouter>>,
    view: Arc<watch::Sender<SessionView>>,
) {
    while let Some(envelope) = rx.recv().await {
        let mut router = router.lock().await;
        let outcome = router.dispatch(envelope).await;
        trace!("Dispatched: {:?}", outcome);
        view.send_modify(|v| v.sync_router(&router));
    }
}
