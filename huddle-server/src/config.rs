use std::net::{IpAddr, Ipv4Addr, SocketAddr};

pub const DEFAULT_ADDR: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8000);

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { addr: DEFAULT_ADDR }
    }
}

impl ServerConfig {
    /// Reads `HUDDLE_ADDR`, falling back to [`DEFAULT_ADDR`].
    pub fn from_env() -> anyhow::Result<Self> {
        match std::env::var("HUDDLE_ADDR") {
            Ok(addr) => Ok(Self {
                addr: addr.parse()?,
            }),
            Err(_) => Ok(Self::default()),
        }
    }
}
