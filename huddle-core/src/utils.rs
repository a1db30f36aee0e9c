use crate::model::IceServerConfig;

pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_2: &str = "stun:stun1.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_3: &str = "stun:stun2.l.google.com:19302";

pub const ROOMS_CREATE_PATH: &str = "/api/rooms/create";
pub const ROOMS_VERIFY_PATH: &str = "/api/rooms/verify";
pub const HEALTH_PATH: &str = "/api/health";
pub const SIGNALING_PATH: &str = "/ws";

/// Public STUN servers used when nothing else is configured. No TURN.
pub fn default_ice_servers() -> Vec<IceServerConfig> {
    [DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2, DEFAULT_STUN_ADDR_3]
        .into_iter()
        .map(|url| IceServerConfig {
            urls: vec![url.to_owned()],
            username: None,
            credential: None,
        })
        .collect()
}
