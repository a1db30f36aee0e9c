mod config;
mod error;
mod media;
mod peer;
mod rooms_api;
mod router;
mod session;
mod signaling;

pub use config::*;
pub use error::*;
pub use media::*;
pub use peer::*;
pub use rooms_api::*;
pub use router::*;
pub use session::*;
pub use signaling::*;
