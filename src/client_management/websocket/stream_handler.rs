use crate::{
    ClientMessage, GameConfig, GameSnapshot, GameStore, PlayerInfo, ServerMessage, StoreError,
};
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use tokio::net::TcpStream;
use tokio_stream::wrappers::WatchStream;
use tokio_tungstenite::{accept_async, tungstenite::Message, WebSocketStream};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    HandShake(String),
    CouldNotSerialize(String),
    CouldNotSend(String),
    Receiving(String),
    Store(String),
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Error::Store(e.to_string())
    }
}

/// One client connection to the authority.
///
/// A connection is bound to at most one game at a time and receives every
/// snapshot of that game.
pub struct StreamHandler {
    pub stream: WebSocketStream<TcpStream>,
    pub connection_id: String,
    pub connected_game: Option<String>,
    updates: Option<WatchStream<GameSnapshot>>,
    store: GameStore,
}

impl StreamHandler {
    const DEFAULT_SIZE: i64 = 15;
    const DEFAULT_WIN_LENGTH: i64 = 5;

    pub async fn handle_stream(stream: TcpStream, store: GameStore) -> Result<(), Error> {
        let stream = accept_async(stream)
            .await
            .map_err(|ws_err| Error::HandShake(ws_err.to_string()))?;

        let mut handler = Self {
            stream,
            connection_id: Uuid::new_v4().to_string(),
            connected_game: None,
            updates: None,
            store,
        };
        debug!("client {} accepted", handler.connection_id);

        let result = handler.run().await;
        handler.unbind();
        debug!("client {} disconnected", handler.connection_id);
        result
    }

    async fn run(&mut self) -> Result<(), Error> {
        loop {
            tokio::select! {
                frame = self.stream.next() => match frame {
                    Some(Ok(Message::Text(text))) => self.handle_text(&text).await?,
                    Some(Ok(Message::Close(_))) | None => return Ok(()),
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(Error::Receiving(e.to_string())),
                },
                Some(snapshot) = next_update(&mut self.updates) => {
                    debug!("sending snapshot of game {} to {}", snapshot.game_id, self.connection_id);
                    self.send(&ServerMessage::GameState { game: snapshot }).await?;
                }
            }
        }
    }

    async fn handle_text(&mut self, text: &str) -> Result<(), Error> {
        let message = match serde_json::from_str::<ClientMessage>(text) {
            Ok(message) => message,
            Err(e) => {
                warn!("could not parse message {:?}: {}", text, e);
                let reply = match unknown_action(text) {
                    Some(action) => format!("Unknown action: {}", action),
                    None => format!("Error processing message: {}", e),
                };
                return self.send_error(reply).await;
            }
        };
        debug!("{} sent {:?}", self.connection_id, message);

        match message {
            ClientMessage::CreateGame {
                size,
                win_length,
                player_name,
            } => {
                let config = GameConfig::normalized(
                    size.unwrap_or(Self::DEFAULT_SIZE),
                    win_length.unwrap_or(Self::DEFAULT_WIN_LENGTH),
                );
                let player_name = player_name.filter(|name| !name.trim().is_empty());
                self.open_game(config, player_name, "Game created. Waiting for another player...")
                    .await
            }
            ClientMessage::JoinGame {
                game_id,
                player_name,
            } => {
                // watch the game before taking a seat so it cannot be released in between
                let joined = match self.bind(game_id.clone()) {
                    Ok(()) => self.store.join_game(&game_id, self.player(player_name)),
                    Err(e) => Err(e),
                };
                match joined {
                    Ok(_) => Ok(()),
                    Err(StoreError::GameNotFound) => {
                        self.send_error(format!("Game not found: {}", game_id)).await
                    }
                    Err(e) => Err(e.into()),
                }
            }
            ClientMessage::MakeMove { row, col } => {
                let Some(game_id) = self.connected_game.clone() else {
                    return self
                        .send_error("No game associated with this session".to_string())
                        .await;
                };
                match self.store.make_move(&game_id, (row, col)) {
                    Ok(new_move) => {
                        debug!("game {}: {:?}", game_id, new_move);
                        Ok(())
                    }
                    Err(StoreError::GameNotFound) => self.send_error("Game not found".to_string()).await,
                    Err(e) => self.send_error(format!("Invalid move: {}", e)).await,
                }
            }
            ClientMessage::ResetGame => {
                let Some(game_id) = self.connected_game.clone() else {
                    return Ok(());
                };
                let config = self.store.config(&game_id).unwrap_or_default();
                let player_name = self
                    .store
                    .seat_of(&game_id, &self.connection_id)
                    .ok()
                    .flatten()
                    .map(|player| player.name);
                self.open_game(config, player_name, "Game reset. Waiting for another player...")
                    .await
            }
        }
    }

    /// Creates a game, binds to it, optionally seats this connection and
    /// reports the new id.
    ///
    /// The connection is bound before anything is sent, so the game is
    /// released with the connection even when the reply cannot be delivered.
    async fn open_game(
        &mut self,
        config: GameConfig,
        player_name: Option<String>,
        message: &str,
    ) -> Result<(), Error> {
        let game_id = self.store.create_game(config)?;
        self.bind(game_id.clone())?;
        if let Some(name) = player_name {
            self.store.join_game(&game_id, self.player(name))?;
        }
        self.send(&ServerMessage::GameCreated {
            game_id,
            size: Some(config.size()),
            win_length: Some(config.win_length()),
            message: Some(message.to_string()),
        })
        .await
    }

    fn player(&self, name: String) -> PlayerInfo {
        PlayerInfo {
            id: self.connection_id.clone(),
            name,
            symbol: None,
        }
    }

    /// Switches this connection to `game_id`. The current snapshot of the
    /// game is sent right away.
    fn bind(&mut self, game_id: String) -> Result<(), StoreError> {
        if self.connected_game.as_deref() == Some(game_id.as_str()) {
            // already subscribed, the next snapshot arrives on its own
            return Ok(());
        }
        let updates = WatchStream::new(self.store.subscribe(&game_id)?);
        self.unbind();
        self.updates = Some(updates);
        info!("client {} bound to game {}", self.connection_id, game_id);
        self.connected_game = Some(game_id);
        Ok(())
    }

    fn unbind(&mut self) {
        self.updates = None;
        if let Some(game_id) = self.connected_game.take() {
            if let Err(e) = self.store.release(&game_id) {
                warn!("could not release game {}: {}", game_id, e);
            }
        }
    }

    async fn send(&mut self, message: &ServerMessage) -> Result<(), Error> {
        let text =
            serde_json::to_string(message).map_err(|e| Error::CouldNotSerialize(e.to_string()))?;
        self.stream
            .send(Message::Text(text))
            .await
            .map_err(|e| Error::CouldNotSend(e.to_string()))
    }

    async fn send_error(&mut self, message: String) -> Result<(), Error> {
        self.send(&ServerMessage::Error { message }).await
    }
}

/// The `action` of a well-formed request that names no known action.
fn unknown_action(text: &str) -> Option<String> {
    const ACTIONS: [&str; 4] = ["create_game", "join_game", "make_move", "reset_game"];
    let value = serde_json::from_str::<serde_json::Value>(text).ok()?;
    let action = value.get("action")?.as_str()?;
    (!ACTIONS.contains(&action)).then(|| action.to_string())
}

async fn next_update(updates: &mut Option<WatchStream<GameSnapshot>>) -> Option<GameSnapshot> {
    match updates {
        Some(updates) => updates.next().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn unknown_action_names_the_action() {
        assert_eq!(unknown_action(r#"{"action":"fly"}"#), Some("fly".to_string()));
        assert_eq!(unknown_action(r#"{"action":"make_move","row":"a"}"#), None);
        assert_eq!(unknown_action(r#"{"action":7}"#), None);
        assert_eq!(unknown_action(r#"{"row":1}"#), None);
        assert_eq!(unknown_action("not json"), None);
    }
}
