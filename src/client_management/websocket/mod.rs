mod server;
mod stream_handler;

pub use server::{ErrorKind, WebSocketServer};
pub use stream_handler::{Error, StreamHandler};
