mod devices;
mod local_stream;
mod media_controller;

pub use devices::*;
pub use local_stream::*;
pub use media_controller::*;
