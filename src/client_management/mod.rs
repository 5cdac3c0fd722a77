mod protocol;
mod remote_session;
pub mod websocket;

pub use protocol::{
    BoardSnapshot, ClientMessage, GameSnapshot, LobbyStatus, PlayerInfo, ServerMessage,
};
pub use remote_session::{ChannelError, RemoteSession, SessionView};
pub use websocket::WebSocketServer;
