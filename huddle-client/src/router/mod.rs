mod inbound;
mod message_router;
mod participant_directory;

pub use inbound::*;
pub use message_router::*;
pub use participant_directory::*;
