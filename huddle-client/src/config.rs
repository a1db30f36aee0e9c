use crate::media::MediaConstraints;
use huddle_core::utils::{SIGNALING_PATH, default_ice_servers};
use huddle_core::{IceServerConfig, RoomId, RoomKey};
use std::time::Duration;
use url::Url;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const DEFAULT_WS_URL: &str = "ws://localhost:8000";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base url of the HTTP room service.
    pub backend_url: String,
    /// Base url of the signaling relay.
    pub ws_url: String,
    pub display_name: String,
    pub ice_servers: Vec<IceServerConfig>,
    pub media: MediaConstraints,
    /// How long an offer may stay unanswered before it is re-sent.
    pub negotiation_timeout: Duration,
    pub max_negotiation_attempts: u32,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            ws_url: DEFAULT_WS_URL.to_string(),
            display_name: String::new(),
            ice_servers: default_ice_servers(),
            media: MediaConstraints::default(),
            negotiation_timeout: Duration::from_secs(15),
            max_negotiation_attempts: 3,
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `HUDDLE_BACKEND_URL`, `HUDDLE_WS_URL` and `HUDDLE_DISPLAY_NAME`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("HUDDLE_BACKEND_URL") {
            config.backend_url = url;
        }
        if let Ok(url) = std::env::var("HUDDLE_WS_URL") {
            config.ws_url = url;
        }
        if let Ok(name) = std::env::var("HUDDLE_DISPLAY_NAME") {
            config.display_name = name;
        }
        config
    }

    pub fn with_server(mut self, backend_url: &str, ws_url: &str) -> Self {
        self.backend_url = backend_url.to_string();
        self.ws_url = ws_url.to_string();
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    /// `{ws_url}/ws/{room_id}?key={room_key}[&name=...]`
    pub fn signaling_url(&self, room_id: &RoomId, room_key: &RoomKey) -> Result<Url, url::ParseError> {
        let base = self.ws_url.trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}{SIGNALING_PATH}/{room_id}"))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("key", room_key.as_str());
            if !self.display_name.is_empty() {
                query.append_pair("name", &self.display_name);
            }
        }
        Ok(url)
    }
}
