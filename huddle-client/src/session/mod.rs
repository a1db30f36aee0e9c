mod room_session;
mod session_view;

pub use room_session::*;
pub use session_view::*;
