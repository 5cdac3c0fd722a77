use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use thiserror::Error;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tokio_stream::wrappers::WatchStream;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::{
    ClientMessage, Coordinates, GameConfig, GameSnapshot, GameSource, GameState, Intent,
    ServerMessage, SourceError,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("could not connect: {0}")]
    Connect(String),
    #[error("could not send: {0}")]
    Send(String),
    #[error("WebSocket connection error: {0}")]
    Receive(String),
    #[error("could not read server message: {0}")]
    Decode(String),
    #[error("connection is closed")]
    Closed,
}

/// What the client knows about the remote game.
///
/// Every `game_state` message replaces `snapshot` as a whole; nothing is
/// merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionView {
    pub game_id: Option<String>,
    pub snapshot: Option<GameSnapshot>,
    pub notice: Option<String>,
    pub connected: bool,
}

impl SessionView {
    pub fn apply(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::GameCreated {
                game_id, message, ..
            } => {
                info!("game {} created", game_id);
                self.game_id = Some(game_id);
                self.snapshot = None;
                self.notice = message;
            }
            ServerMessage::GameState { game } => {
                debug!("snapshot for game {}", game.game_id);
                if game.seats_filled() && self.notice.is_some() {
                    self.notice = None;
                }
                self.game_id = Some(game.game_id.clone());
                self.snapshot = Some(game);
            }
            ServerMessage::Error { message } => {
                warn!("server error: {}", message);
                self.notice = Some(message);
            }
        }
    }

    pub fn channel_error(&mut self, error: &ChannelError) {
        self.notice = Some(error.to_string());
    }

    /// The game as it should be rendered; `None` until both seats are taken.
    pub fn state(&self) -> Option<GameState> {
        self.snapshot.as_ref().and_then(GameSnapshot::to_game_state)
    }
}

/// A connection to a remote authority.
///
/// Inbound messages are applied one after another, in the order they
/// arrive, by a single reader task. The session owns the connection: it is
/// closed by [`RemoteSession::close`] or when the session is dropped, and no
/// message is applied after that.
pub struct RemoteSession {
    outbound: Option<mpsc::UnboundedSender<ClientMessage>>,
    view: Arc<watch::Sender<SessionView>>,
    closed: Arc<AtomicBool>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl RemoteSession {
    pub async fn connect(url: &str) -> Result<Self, ChannelError> {
        debug!("connecting to {}", url);
        let (ws_stream, _) = connect_async(url)
            .await
            .map_err(|e| ChannelError::Connect(e.to_string()))?;
        info!("connected to {}", url);

        let (mut ws_sender, mut ws_receiver) = ws_stream.split();
        let (view, _) = watch::channel(SessionView {
            connected: true,
            ..Default::default()
        });
        let view = Arc::new(view);
        let closed = Arc::new(AtomicBool::new(false));
        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<ClientMessage>();

        let writer_view = view.clone();
        let writer_closed = closed.clone();
        let writer = tokio::spawn(async move {
            while let Some(message) = outbound_rx.recv().await {
                let text = match serde_json::to_string(&message) {
                    Ok(text) => text,
                    Err(e) => {
                        error!("could not serialize {:?}: {}", message, e);
                        continue;
                    }
                };
                debug!("sending {}", text);
                if let Err(e) = ws_sender.send(Message::Text(text)).await {
                    let e = ChannelError::Send(e.to_string());
                    error!("{}", e);
                    publish(&writer_view, &writer_closed, |view| view.channel_error(&e));
                    break;
                }
            }
            // queue closed: the session is shutting down
            if let Err(e) = ws_sender.close().await {
                debug!("error closing websocket: {}", e);
            }
        });

        let reader_view = view.clone();
        let reader_closed = closed.clone();
        let reader = tokio::spawn(async move {
            while let Some(frame) = ws_receiver.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        let applied = match serde_json::from_str::<ServerMessage>(&text) {
                            Ok(message) => {
                                publish(&reader_view, &reader_closed, |view| view.apply(message))
                            }
                            Err(e) => {
                                let e = ChannelError::Decode(e.to_string());
                                warn!("{}", e);
                                publish(&reader_view, &reader_closed, |view| view.channel_error(&e))
                            }
                        };
                        if !applied {
                            debug!("session closed, dropping inbound messages");
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => {
                        debug!("server closed the connection");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        let e = ChannelError::Receive(e.to_string());
                        error!("{}", e);
                        publish(&reader_view, &reader_closed, |view| view.channel_error(&e));
                        break;
                    }
                }
            }
            publish(&reader_view, &reader_closed, |view| view.connected = false);
        });

        Ok(Self {
            outbound: Some(outbound),
            view,
            closed,
            reader,
            writer,
        })
    }

    /// Stops applying inbound messages and closes the connection. Safe to
    /// call more than once.
    pub fn close(&mut self) {
        let closed = &self.closed;
        // flagged under the view lock, so the reader either finished its
        // update before this or sees the flag and stops
        let closing = self.view.send_if_modified(|view| {
            if closed.swap(true, Ordering::AcqRel) {
                return false;
            }
            view.connected = false;
            true
        });
        if closing {
            debug!("closing remote session");
        }
        self.reader.abort();
        self.outbound.take();
    }

    pub fn is_open(&self) -> bool {
        self.outbound
            .as_ref()
            .is_some_and(|outbound| !outbound.is_closed())
            && !self.writer.is_finished()
            && self.view.borrow().connected
    }

    pub fn view(&self) -> SessionView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view.subscribe()
    }

    pub fn updates(&self) -> WatchStream<SessionView> {
        WatchStream::new(self.subscribe())
    }

    fn send(&self, message: ClientMessage) -> Result<(), ChannelError> {
        if !self.is_open() {
            return Err(ChannelError::Closed);
        }
        self.outbound
            .as_ref()
            .ok_or(ChannelError::Closed)?
            .send(message)
            .map_err(|_| ChannelError::Closed)
    }

    fn missing_input(&self, message: &'static str) -> SourceError {
        self.view
            .send_modify(|view| view.notice = Some(message.to_string()));
        SourceError::MissingInput(message)
    }

    pub fn create_game(
        &self,
        config: GameConfig,
        player_name: Option<&str>,
    ) -> Result<(), SourceError> {
        let player_name = match player_name.map(str::trim) {
            Some("") => return Err(self.missing_input("Please enter your name")),
            name => name.map(str::to_string),
        };
        Ok(self.send(ClientMessage::create_game(config, player_name))?)
    }

    pub fn join_game(&self, game_id: &str, player_name: &str) -> Result<(), SourceError> {
        if player_name.trim().is_empty() {
            return Err(self.missing_input("Please enter your name"));
        }
        if game_id.trim().is_empty() {
            return Err(self.missing_input("Please enter a game ID"));
        }
        Ok(self.send(ClientMessage::JoinGame {
            game_id: game_id.trim().to_string(),
            player_name: player_name.trim().to_string(),
        })?)
    }

    /// Forwards a move to the authority. Only checks that the connection is
    /// open and a game is running; legality is decided remotely.
    pub fn make_move(&self, (row, col): Coordinates) -> Result<(), SourceError> {
        if !self.is_open() {
            return Err(ChannelError::Closed.into());
        }
        if self.view.borrow().state().is_none() {
            return Err(SourceError::NoGameInProgress);
        }
        Ok(self.send(ClientMessage::MakeMove { row, col })?)
    }

    /// Asks for a new game with the same settings. The current snapshot is
    /// dropped until the authority reports the new game.
    pub fn reset_game(&self) -> Result<(), SourceError> {
        self.send(ClientMessage::ResetGame)?;
        self.view.send_modify(|view| view.snapshot = None);
        Ok(())
    }
}

impl Drop for RemoteSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl GameSource for RemoteSession {
    fn current_state(&self) -> Option<GameState> {
        self.view.borrow().state()
    }

    fn apply_intent(&mut self, intent: Intent) -> Result<(), SourceError> {
        match intent {
            Intent::CreateGame {
                config,
                player_name,
            } => self.create_game(config, player_name.as_deref()),
            Intent::JoinGame {
                game_id,
                player_name,
            } => self.join_game(&game_id, &player_name),
            Intent::MakeMove { coordinates } => self.make_move(coordinates),
            Intent::Reset => self.reset_game(),
        }
    }

    fn notice(&self) -> Option<String> {
        self.view.borrow().notice.clone()
    }

    fn game_id(&self) -> Option<String> {
        self.view.borrow().game_id.clone()
    }
}

/// Applies `update` to the view unless the session was closed. Returns
/// whether the update was applied.
fn publish(
    view: &watch::Sender<SessionView>,
    closed: &AtomicBool,
    update: impl FnOnce(&mut SessionView),
) -> bool {
    view.send_if_modified(|view| {
        if closed.load(Ordering::Acquire) {
            return false;
        }
        update(view);
        true
    })
}
