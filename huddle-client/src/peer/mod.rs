mod peer_connection_entry;
mod peer_connection_manager;
mod peer_event;
mod peer_link;
mod rtc_peer_link;

pub use peer_connection_entry::*;
pub use peer_connection_manager::*;
pub use peer_event::*;
pub use peer_link::*;
pub use rtc_peer_link::*;
